use std::io::{Cursor, Write};

use tiff::encoder::colortype::{Gray8, Gray16};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::roi_pipeline::common::error::{MonitorError, Result};
use crate::roi_pipeline::decode::IntensityMatrix;
use crate::roi_pipeline::export::types::{ExportConfig, TiffCompression};
use crate::roi_pipeline::overlay::DisplayImage;

pub trait SnapshotWriter {
    fn write_matrix(&self, matrix: &IntensityMatrix, output: &mut dyn Write, config: &ExportConfig) -> Result<()>;
    fn write_display(&self, image: &DisplayImage, output: &mut dyn Write, config: &ExportConfig) -> Result<()>;
}

/// Writes frames as grayscale TIFF: matrices as 16-bit, previews as 8-bit.
pub struct TiffSnapshotWriter;

impl TiffSnapshotWriter {
    fn encoder<'a>(buffer: &'a mut Vec<u8>, config: &ExportConfig) -> Result<TiffEncoder<Cursor<&'a mut Vec<u8>>>> {
        let compression = match config.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut encoder = TiffEncoder::new(Cursor::new(buffer))
            .map_err(|e| MonitorError::EncodeError(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }
        Ok(encoder)
    }
}

impl SnapshotWriter for TiffSnapshotWriter {
    fn write_matrix(&self, matrix: &IntensityMatrix, output: &mut dyn Write, config: &ExportConfig) -> Result<()> {
        debug!("Encoding matrix TIFF: {}x{}", matrix.width(), matrix.height());

        let mut buffer = Vec::new();
        Self::encoder(&mut buffer, config)?
            .write_image::<Gray16>(matrix.width() as u32, matrix.height() as u32, matrix.data())
            .map_err(|e| MonitorError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }

    fn write_display(&self, image: &DisplayImage, output: &mut dyn Write, config: &ExportConfig) -> Result<()> {
        debug!("Encoding preview TIFF: {}x{}", image.width, image.height);

        let mut buffer = Vec::new();
        Self::encoder(&mut buffer, config)?
            .write_image::<Gray8>(image.width as u32, image.height as u32, &image.data)
            .map_err(|e| MonitorError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }
}
