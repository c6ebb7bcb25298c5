//! Overlay rendering module
//!
//! Normalizes intensity matrices to 8 bits, marks the ROI band, and downscales for display.

mod renderer;
pub mod types;

pub use renderer::{OverlayRenderer, downscale, draw_band_outline, normalize, normalize_sample};
pub use types::{DISPLAY_MAX, DisplayImage};
