//! Region of interest geometry

use std::ops::Range;

use crate::roi_pipeline::common::error::{MonitorError, Result};

/// How a band that extends past the frame is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoiBounds {
    /// Intersect the band with the frame; only an empty intersection is an error
    #[default]
    Clamp,
    /// Reject any band that is not fully inside the frame
    Strict,
}

/// A horizontal band of rows `[center - half_height, center + half_height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub center: u32,
    pub half_height: u32,
}

impl Roi {
    pub fn new(center: u32, half_height: u32) -> Self {
        Self {
            center,
            half_height,
        }
    }

    /// First row of the band, possibly negative
    pub fn top(&self) -> i64 {
        self.center as i64 - self.half_height as i64
    }

    /// One past the last row of the band
    pub fn bottom(&self) -> i64 {
        self.center as i64 + self.half_height as i64
    }

    /// Resolves the band against a frame of `height` rows.
    pub fn rows(&self, height: usize, bounds: RoiBounds) -> Result<Range<usize>> {
        let (top, bottom) = (self.top(), self.bottom());
        let out_of_range = || MonitorError::RoiOutOfRange {
            start: top,
            end: bottom,
            height,
        };

        if bounds == RoiBounds::Strict && (top < 0 || bottom > height as i64) {
            return Err(out_of_range());
        }

        let start = top.clamp(0, height as i64) as usize;
        let end = bottom.clamp(0, height as i64) as usize;
        if start >= end {
            return Err(out_of_range());
        }
        Ok(start..end)
    }
}
