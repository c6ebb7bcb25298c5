//! Decoded frame types

use crate::roi_pipeline::common::error::{MonitorError, Result};

/// Largest value a 12-bit sample can carry
pub const SAMPLE_MAX: u16 = 4095;

/// Row-major grid of decoded sensor samples.
///
/// Values normally lie in `0..=4095`; the packed format can yield larger values for corrupt
/// low bytes and those are kept as decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityMatrix {
    width: usize,
    height: usize,
    data: Vec<u16>,
}

impl IntensityMatrix {
    pub fn from_vec(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(MonitorError::FormatError {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: usize, height: usize, value: u16) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn row(&self, row: usize) -> &[u16] {
        let start = row * self.width;
        &self.data[start..start + self.width]
    }

    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.width + col]
    }
}
