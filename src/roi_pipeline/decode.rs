//! Frame decoding module
//!
//! Converts packed raw sensor bytes into 12-bit intensity matrices.

mod packed_decoder;
pub mod types;

pub use packed_decoder::{PackedDecoder, combine, unpack_samples};
pub use types::{IntensityMatrix, SAMPLE_MAX};
