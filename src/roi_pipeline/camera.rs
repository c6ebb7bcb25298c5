//! Camera session module
//!
//! This module owns the capture device: configuration at open, raw frame capture, and
//! best-effort brightness/gain writes. Devices are reached through the `CameraBackend` seam.

mod device;
mod session;
pub mod synthetic_device;
pub mod types;
#[cfg(feature = "v4l")]
pub mod v4l_device;

pub use device::{CameraBackend, CameraDevice};
pub use session::CameraSession;
pub use synthetic_device::{SyntheticBackend, SyntheticDevice, SyntheticOptions};
pub use types::{DeviceProperty, RawFrame, SensorConfig, SensorConfigBuilder};
#[cfg(feature = "v4l")]
pub use v4l_device::{V4lBackend, V4lDevice};
