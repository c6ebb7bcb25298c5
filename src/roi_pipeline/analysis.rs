//! ROI analysis module
//!
//! Reduces a horizontal band of the intensity matrix to a per-column profile.

mod profile;
pub mod roi;

pub use profile::{IntensityProfile, RoiAnalyzer};
pub use roi::{Roi, RoiBounds};
