//! Acquisition parameters module
//!
//! The shared parameter record, its validated domains, and the event channel the UI uses to
//! change it.

mod control;
pub mod parameters;

pub use control::{ControlEvent, ControlPanel, control_channel};
pub use parameters::{
    AcquisitionParameters, BRIGHTNESS, DeviceParameters, GAIN, ParameterChanged, ParameterRange,
    ROI_CENTER, ROI_HALF_HEIGHT, SharedParameters,
};
