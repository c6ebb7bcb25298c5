//! Operator-tunable acquisition parameters.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::roi_pipeline::analysis::Roi;
use crate::roi_pipeline::common::error::{MonitorError, Result};

/// Inclusive domain of an integer control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterRange {
    pub name: &'static str,
    pub min: u32,
    pub max: u32,
}

impl ParameterRange {
    pub fn check(&self, value: u32) -> Result<u32> {
        if value < self.min || value > self.max {
            return Err(MonitorError::InvalidParameter {
                name: self.name,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }
}

pub const ROI_CENTER: ParameterRange = ParameterRange { name: "roi_center", min: 0, max: 900 };
pub const ROI_HALF_HEIGHT: ParameterRange = ParameterRange { name: "roi_half_height", min: 1, max: 30 };
pub const BRIGHTNESS: ParameterRange = ParameterRange { name: "brightness", min: 0, max: 800 };
pub const GAIN: ParameterRange = ParameterRange { name: "gain", min: 1, max: 32 };

/// A single operator change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterChanged {
    RoiCenter(u32),
    RoiHalfHeight(u32),
    Brightness(u32),
    Gain(u32),
}

impl ParameterChanged {
    pub fn range(&self) -> ParameterRange {
        match self {
            ParameterChanged::RoiCenter(_) => ROI_CENTER,
            ParameterChanged::RoiHalfHeight(_) => ROI_HALF_HEIGHT,
            ParameterChanged::Brightness(_) => BRIGHTNESS,
            ParameterChanged::Gain(_) => GAIN,
        }
    }

    pub fn value(&self) -> u32 {
        match *self {
            ParameterChanged::RoiCenter(v)
            | ParameterChanged::RoiHalfHeight(v)
            | ParameterChanged::Brightness(v)
            | ParameterChanged::Gain(v) => v,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.range().check(self.value()).map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionParameters {
    pub roi_center: u32,
    pub roi_half_height: u32,
    pub brightness: u32,
    pub gain: u32,
}

impl Default for AcquisitionParameters {
    fn default() -> Self {
        Self {
            roi_center: 500,
            roi_half_height: 10,
            brightness: 500,
            gain: 8,
        }
    }
}

impl AcquisitionParameters {
    pub fn roi(&self) -> Roi {
        Roi::new(self.roi_center, self.roi_half_height)
    }

    /// Applies a validated change; an out-of-domain value leaves the record untouched.
    pub fn apply(&mut self, change: ParameterChanged) -> Result<()> {
        change.validate()?;
        match change {
            ParameterChanged::RoiCenter(v) => self.roi_center = v,
            ParameterChanged::RoiHalfHeight(v) => self.roi_half_height = v,
            ParameterChanged::Brightness(v) => self.brightness = v,
            ParameterChanged::Gain(v) => self.gain = v,
        }
        Ok(())
    }
}

/// Receiver of parameter writes that must reach the sensor.
pub trait DeviceParameters {
    fn write_brightness(&mut self, value: u32) -> Result<()>;
    fn write_gain(&mut self, value: u32) -> Result<()>;
}

/// Parameters shared between the update loop and the control surface.
///
/// Writers hold the lock only for the duration of a field update and readers take a copy, so
/// a cycle always works from one consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct SharedParameters {
    inner: Arc<RwLock<AcquisitionParameters>>,
}

impl SharedParameters {
    pub fn new(initial: AcquisitionParameters) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn snapshot(&self) -> AcquisitionParameters {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, change: ParameterChanged) -> Result<()> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(change)
    }

    /// Commits a change to the record and, for brightness and gain, to the device.
    ///
    /// The record is updated first; the device write follows synchronously. A failed device
    /// write is returned but the record keeps the new value, matching what the operator set.
    pub fn commit<D: DeviceParameters + ?Sized>(
        &self,
        change: ParameterChanged,
        device: &mut D,
    ) -> Result<()> {
        self.update(change)?;
        debug!(?change, "Parameter committed");
        match change {
            ParameterChanged::Brightness(v) => device.write_brightness(v),
            ParameterChanged::Gain(v) => device.write_gain(v),
            ParameterChanged::RoiCenter(_) | ParameterChanged::RoiHalfHeight(_) => Ok(()),
        }
    }
}
