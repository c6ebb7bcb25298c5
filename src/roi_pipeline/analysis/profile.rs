use tracing::debug;

use crate::roi_pipeline::analysis::roi::{Roi, RoiBounds};
use crate::roi_pipeline::common::error::Result;
use crate::roi_pipeline::decode::IntensityMatrix;

/// Per-column mean intensity over an ROI band.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityProfile {
    values: Vec<f64>,
}

impl IntensityProfile {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column index and value of the brightest entry
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.values
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// Reduces an ROI band to an intensity profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoiAnalyzer {
    bounds: RoiBounds,
}

impl RoiAnalyzer {
    pub fn new(bounds: RoiBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> RoiBounds {
        self.bounds
    }

    pub fn analyze(&self, matrix: &IntensityMatrix, roi: Roi) -> Result<IntensityProfile> {
        let rows = roi.rows(matrix.height(), self.bounds)?;
        let count = rows.len() as f64;
        debug!(start = rows.start, end = rows.end, "Reducing ROI band");

        let mut sums = vec![0u64; matrix.width()];
        for row in rows {
            for (sum, &value) in sums.iter_mut().zip(matrix.row(row)) {
                *sum += value as u64;
            }
        }

        Ok(IntensityProfile::new(
            sums.into_iter().map(|sum| sum as f64 / count).collect(),
        ))
    }
}
