use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::roi_pipeline::analysis::IntensityProfile;
use crate::roi_pipeline::common::error::{MonitorError, Result};
use crate::roi_pipeline::decode::IntensityMatrix;
use crate::roi_pipeline::export::profile_text::save_profile;
use crate::roi_pipeline::export::snapshot_writer::{SnapshotWriter, TiffSnapshotWriter};
use crate::roi_pipeline::export::types::ExportConfig;
use crate::roi_pipeline::overlay::DisplayImage;

/// File export of the loop's latest results.
pub struct Exporter<W: SnapshotWriter> {
    writer: W,
    config: ExportConfig,
}

impl Exporter<TiffSnapshotWriter> {
    pub fn new(config: ExportConfig) -> Self {
        Self::with_custom(TiffSnapshotWriter, config)
    }
}

impl Default for Exporter<TiffSnapshotWriter> {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl<W: SnapshotWriter> Exporter<W> {
    pub fn with_custom(writer: W, config: ExportConfig) -> Self {
        Self { writer, config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn save_profile(&self, path: &Path, profile: &IntensityProfile) -> Result<()> {
        save_profile(path, profile, self.config.precision)
    }

    pub fn save_matrix(&self, path: &Path, matrix: &IntensityMatrix) -> Result<()> {
        let mut file = create(path)?;
        self.writer.write_matrix(matrix, &mut file, &self.config)?;
        info!(path = %path.display(), "Matrix snapshot saved");
        Ok(())
    }

    pub fn save_display(&self, path: &Path, image: &DisplayImage) -> Result<()> {
        let mut file = create(path)?;
        self.writer.write_display(image, &mut file, &self.config)?;
        info!(path = %path.display(), "Preview snapshot saved");
        Ok(())
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| MonitorError::ExportError(format!("{}: {}", path.display(), e)))
}
