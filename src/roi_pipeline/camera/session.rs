//! Scoped ownership of the capture device.
//!
//! A `CameraSession` is the only owner of a device handle. The handle is configured on open
//! and released exactly once, either by `close()` or when the session is dropped. A failure
//! partway through configuration drops the half-configured session, which releases the handle.

use tracing::{debug, info, instrument, warn};

use crate::roi_pipeline::camera::device::{CameraBackend, CameraDevice};
use crate::roi_pipeline::camera::types::{DeviceProperty, RawFrame, SensorConfig};
use crate::roi_pipeline::common::error::{MonitorError, Result};
use crate::roi_pipeline::params::DeviceParameters;

pub struct CameraSession<D: CameraDevice> {
    device: Option<D>,
    config: SensorConfig,
}

impl<D: CameraDevice> CameraSession<D> {
    /// Opens the device at `config.device_index` and applies the sensor configuration.
    ///
    /// Geometry, mode and RGB-conversion writes must succeed, otherwise the raw stream cannot
    /// be decoded and the open fails with `DeviceUnavailable`. Brightness and gain are
    /// best-effort.
    #[instrument(skip(backend, config), fields(index = config.device_index))]
    pub fn open<B>(backend: &B, config: SensorConfig) -> Result<Self>
    where
        B: CameraBackend<Device = D>,
    {
        let device = backend.open(config.device_index).map_err(|e| match e {
            MonitorError::DeviceUnavailable(_) => e,
            other => MonitorError::DeviceUnavailable(other.to_string()),
        })?;

        let mut session = Self {
            device: Some(device),
            config,
        };
        session.configure()?;

        info!(
            width = session.config.width,
            height = session.config.height,
            mode = session.config.capture_mode,
            "Camera session opened"
        );
        Ok(session)
    }

    fn configure(&mut self) -> Result<()> {
        let required = [
            (DeviceProperty::FrameWidth, self.config.width as f64),
            (DeviceProperty::FrameHeight, self.config.height as f64),
            (DeviceProperty::Mode, self.config.capture_mode as f64),
            (DeviceProperty::ConvertRgb, if self.config.convert_rgb { 1.0 } else { 0.0 }),
        ];

        for (property, value) in required {
            self.device_mut()?
                .set_property(property, value)
                .map_err(|e| {
                    MonitorError::DeviceUnavailable(format!(
                        "failed to set {}: {}",
                        property.as_str(),
                        e
                    ))
                })?;
        }

        // A rejected exposure setting still leaves a usable stream.
        let _ = self.set_brightness(self.config.initial_brightness);
        let _ = self.set_gain(self.config.initial_gain);
        Ok(())
    }

    fn device_mut(&mut self) -> Result<&mut D> {
        self.device
            .as_mut()
            .ok_or_else(|| MonitorError::DeviceUnavailable("session already closed".to_string()))
    }

    /// Grabs one raw frame. A device that returns nothing, an empty buffer, or a transient
    /// read error surfaces as `FrameUnavailable`. A device that is gone (`DeviceUnavailable`)
    /// is passed through so the caller can stop.
    pub fn capture(&mut self) -> Result<RawFrame> {
        let expected = self.config.frame_bytes();
        match self.device_mut()?.read_frame() {
            Ok(Some(frame)) if !frame.is_empty() => {
                if frame.len() == expected {
                    debug!(bytes = frame.len(), "Captured raw frame");
                } else {
                    debug!(bytes = frame.len(), expected, "Captured raw frame of unexpected size");
                }
                Ok(frame)
            }
            Ok(_) => Err(MonitorError::FrameUnavailable),
            Err(e @ MonitorError::DeviceUnavailable(_)) => {
                warn!(error = %e, "Camera lost");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Frame read failed");
                Err(MonitorError::FrameUnavailable)
            }
        }
    }

    pub fn set_brightness(&mut self, value: u32) -> Result<()> {
        self.write_parameter(DeviceProperty::Brightness, value)
    }

    pub fn set_gain(&mut self, value: u32) -> Result<()> {
        self.write_parameter(DeviceProperty::Gain, value)
    }

    fn write_parameter(&mut self, property: DeviceProperty, value: u32) -> Result<()> {
        let result = self.device_mut()?.set_property(property, value as f64);
        match result {
            Ok(()) => {
                debug!(property = property.as_str(), value, "Device parameter written");
                Ok(())
            }
            Err(e) => {
                warn!(property = property.as_str(), value, error = %e, "Device parameter write failed");
                Err(MonitorError::DeviceWrite(format!("{}={}: {}", property.as_str(), value, e)))
            }
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Releases the device now instead of at drop time.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            info!("Camera session closed");
        }
    }
}

impl<D: CameraDevice> DeviceParameters for CameraSession<D> {
    fn write_brightness(&mut self, value: u32) -> Result<()> {
        self.set_brightness(value)
    }

    fn write_gain(&mut self, value: u32) -> Result<()> {
        self.set_gain(value)
    }
}

impl<D: CameraDevice> Drop for CameraSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}
