//! Decoder for the sensor's packed two-byte raw format.
//!
//! Each sample travels as a (high, low) byte pair. The high byte holds bits 4..12 and the low
//! byte holds bits 0..4 offset by 128, so a sample is rebuilt as
//! `(high << 4) | (low - 128)`. The subtraction is done in wrapping 16-bit arithmetic: a low
//! byte under 128 wraps to a large value whose upper bits flood the result. Frames produced by
//! the sensor never carry such bytes, and the wrapped values are kept rather than clamped so
//! the decoded output is bit-identical to the vendor tooling.

use tracing::debug;

use crate::roi_pipeline::camera::types::{FRAME_HEIGHT, FRAME_WIDTH, RawFrame};
use crate::roi_pipeline::common::error::Result;
use crate::roi_pipeline::decode::types::IntensityMatrix;

const LOW_BYTE_OFFSET: u16 = 128;

/// Rebuilds one sample from its byte pair.
#[inline]
pub fn combine(high: u8, low: u8) -> u16 {
    ((high as u16) << 4) | (low as u16).wrapping_sub(LOW_BYTE_OFFSET)
}

/// Unpacks a byte stream into samples, one per byte pair.
///
/// An odd trailing byte is treated as a high byte whose low byte is 0.
pub fn unpack_samples(buffer: &[u8]) -> Vec<u16> {
    let mut samples = Vec::with_capacity(buffer.len().div_ceil(2));
    let mut pairs = buffer.chunks_exact(2);
    for pair in &mut pairs {
        samples.push(combine(pair[0], pair[1]));
    }
    if let [high] = pairs.remainder() {
        samples.push(combine(*high, 0));
    }
    samples
}

/// Turns raw frames into intensity matrices of a fixed geometry.
#[derive(Debug, Clone)]
pub struct PackedDecoder {
    width: usize,
    height: usize,
}

impl Default for PackedDecoder {
    fn default() -> Self {
        Self::new(FRAME_WIDTH, FRAME_HEIGHT)
    }
}

impl PackedDecoder {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Decodes a frame. A buffer whose sample count differs from `width * height` is a
    /// `FormatError`; no partially filled matrix is returned.
    pub fn decode(&self, frame: &RawFrame) -> Result<IntensityMatrix> {
        self.decode_bytes(&frame.data)
    }

    pub fn decode_bytes(&self, buffer: &[u8]) -> Result<IntensityMatrix> {
        debug!(bytes = buffer.len(), "Decoding packed frame");
        let samples = unpack_samples(buffer);
        IntensityMatrix::from_vec(self.width, self.height, samples)
    }
}
