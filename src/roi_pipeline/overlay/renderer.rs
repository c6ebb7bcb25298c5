use tracing::debug;

use crate::roi_pipeline::analysis::Roi;
use crate::roi_pipeline::decode::IntensityMatrix;
use crate::roi_pipeline::overlay::types::{DISPLAY_MAX, DisplayImage};

/// Divisor of the 12-bit logical range
const NORMALIZE_DIVISOR: f64 = 4096.0;

/// Maps a decoded sample onto the display range, saturating at `DISPLAY_MAX`.
#[inline]
pub fn normalize_sample(value: u16) -> u8 {
    let scaled = (value as f64 / NORMALIZE_DIVISOR * DISPLAY_MAX as f64) as u32;
    scaled.min(DISPLAY_MAX as u32) as u8
}

pub fn normalize(matrix: &IntensityMatrix) -> DisplayImage {
    DisplayImage {
        width: matrix.width(),
        height: matrix.height(),
        data: matrix.data().iter().map(|&v| normalize_sample(v)).collect(),
    }
}

/// Draws the outline of the rectangle spanning all columns between rows `top` and `bottom`.
///
/// Each edge is `thickness` pixels wide and straddles its coordinate, covering
/// `[edge - thickness / 2, edge - thickness / 2 + thickness)`. Anything outside the image is
/// clipped.
pub fn draw_band_outline(image: &mut DisplayImage, top: i64, bottom: i64, thickness: usize) {
    if image.width == 0 || image.height == 0 || thickness == 0 {
        return;
    }
    let (width, height) = (image.width as i64, image.height as i64);
    let half = (thickness / 2) as i64;
    let thickness = thickness as i64;
    let (top, bottom) = (top.min(bottom), top.max(bottom));

    let mut fill = |rows: std::ops::Range<i64>, cols: std::ops::Range<i64>| {
        let rows = rows.start.clamp(0, height)..rows.end.clamp(0, height);
        let cols = cols.start.clamp(0, width)..cols.end.clamp(0, width);
        for row in rows {
            let offset = (row * width) as usize;
            image.data[offset + cols.start as usize..offset + cols.end as usize].fill(DISPLAY_MAX);
        }
    };

    // horizontal edges
    fill(top - half..top - half + thickness, 0..width + 1);
    fill(bottom - half..bottom - half + thickness, 0..width + 1);
    // vertical edges at column 0 and one past the last column
    fill(top - half..bottom - half + thickness, -half..thickness - half);
    fill(top - half..bottom - half + thickness, width - half..width - half + thickness);
}

/// Bilinear resize by `scale` on both axes, sampling at pixel centers.
pub fn downscale(image: &DisplayImage, scale: f64) -> DisplayImage {
    let dst_w = ((image.width as f64 * scale).round() as usize).max(1);
    let dst_h = ((image.height as f64 * scale).round() as usize).max(1);
    if image.width == 0 || image.height == 0 {
        return DisplayImage::filled(0, 0, 0);
    }

    let inv_x = image.width as f64 / dst_w as f64;
    let inv_y = image.height as f64 / dst_h as f64;

    let sample_axis = |dst: usize, inv: f64, len: usize| -> (usize, usize, f64) {
        let src = ((dst as f64 + 0.5) * inv - 0.5).max(0.0);
        let i0 = (src.floor() as usize).min(len - 1);
        let i1 = (i0 + 1).min(len - 1);
        (i0, i1, src - i0 as f64)
    };

    let columns: Vec<(usize, usize, f64)> =
        (0..dst_w).map(|x| sample_axis(x, inv_x, image.width)).collect();

    let mut data = Vec::with_capacity(dst_w * dst_h);
    for y in 0..dst_h {
        let (y0, y1, fy) = sample_axis(y, inv_y, image.height);
        let (r0, r1) = (image.row(y0), image.row(y1));
        for &(x0, x1, fx) in &columns {
            let top = r0[x0] as f64 * (1.0 - fx) + r0[x1] as f64 * fx;
            let bottom = r1[x0] as f64 * (1.0 - fx) + r1[x1] as f64 * fx;
            data.push((top * (1.0 - fy) + bottom * fy).round() as u8);
        }
    }

    DisplayImage {
        width: dst_w,
        height: dst_h,
        data,
    }
}

/// Produces the annotated, downscaled preview of a frame.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRenderer {
    scale: f64,
    thickness: usize,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            scale: 0.4,
            thickness: 2,
        }
    }
}

impl OverlayRenderer {
    pub fn new(scale: f64, thickness: usize) -> Self {
        Self { scale, thickness }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn render(&self, matrix: &IntensityMatrix, roi: Roi) -> DisplayImage {
        let mut image = normalize(matrix);
        draw_band_outline(&mut image, roi.top(), roi.bottom(), self.thickness);
        let preview = downscale(&image, self.scale);
        debug!(width = preview.width, height = preview.height, "Rendered preview");
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoints() {
        assert_eq!(normalize_sample(0), 0);
        assert_eq!(normalize_sample(4096), 254);
        assert_eq!(normalize_sample(4095), 253);
        assert_eq!(normalize_sample(u16::MAX), 254);
    }

    #[test]
    fn test_normalize_is_monotonic() {
        let mut previous = 0;
        for value in 0..=4095u16 {
            let current = normalize_sample(value);
            assert!(current >= previous, "value {value}");
            previous = current;
        }
    }

    #[test]
    fn test_outline_rows_are_two_pixels_thick() {
        let mut image = DisplayImage::filled(8, 20, 0);
        draw_band_outline(&mut image, 5, 15, 2);

        for row in [4, 5, 14, 15] {
            assert!(image.row(row).iter().all(|&v| v == DISPLAY_MAX), "row {row}");
        }
        assert!(image.row(3).iter().all(|&v| v == 0));
        assert!(image.row(16).iter().all(|&v| v == 0));
        // sides inside the band
        assert_eq!(image.get(10, 0), DISPLAY_MAX);
        assert_eq!(image.get(10, 7), DISPLAY_MAX);
        assert_eq!(image.get(10, 3), 0);
    }

    #[test]
    fn test_outline_clips_outside_image() {
        let mut image = DisplayImage::filled(4, 10, 0);
        draw_band_outline(&mut image, -5, 30, 2);
        assert_eq!(image.get(5, 1), 0);
        assert_eq!(image.get(5, 0), DISPLAY_MAX);
    }

    #[test]
    fn test_render_produces_scaled_preview() {
        let matrix = IntensityMatrix::filled(1280, 800, 2048);
        let preview = OverlayRenderer::default().render(&matrix, Roi::new(500, 10));

        assert_eq!((preview.width, preview.height), (512, 320));
        assert!(preview.data.iter().all(|&v| v <= DISPLAY_MAX));
        // far from the band the preview keeps the normalized level
        assert_eq!(preview.get(50, 256), 127);
    }

    #[test]
    fn test_downscale_uniform_image() {
        let image = DisplayImage::filled(10, 10, 90);
        let small = downscale(&image, 0.4);
        assert_eq!((small.width, small.height), (4, 4));
        assert!(small.data.iter().all(|&v| v == 90));
    }
}
