use crate::roi_pipeline::common::error::Result;
use crate::roi_pipeline::camera::types::{DeviceProperty, RawFrame};

/// A handle to an opened capture device.
///
/// Only `CameraSession` calls into a device; everything else goes through the session.
pub trait CameraDevice: Send {
    fn set_property(&mut self, property: DeviceProperty, value: f64) -> Result<()>;

    /// Reads the next frame. `Ok(None)` means the device produced no data this time.
    fn read_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Releases the underlying handle. Called exactly once by the owning session.
    fn release(&mut self);
}

/// Opens devices by logical index.
pub trait CameraBackend {
    type Device: CameraDevice;

    fn open(&self, index: u32) -> Result<Self::Device>;
}
