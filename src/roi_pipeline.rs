//! ROI monitoring pipeline module
//!
//! This module provides the live acquisition loop for the slit spectrometer camera, with
//! separate modules for device access, frame decoding, ROI analysis, display rendering,
//! parameter control, export, and cycle scheduling.

pub mod analysis;
pub mod camera;
pub mod common;
pub mod decode;
pub mod export;
pub mod overlay;
pub mod params;
pub mod update_loop;

pub use common::{MonitorError, Result};

pub use camera::{
    CameraBackend, CameraDevice, CameraSession, DeviceProperty, RawFrame, SensorConfig,
    SensorConfigBuilder, SyntheticBackend, SyntheticOptions,
};

pub use decode::{IntensityMatrix, PackedDecoder};

pub use analysis::{IntensityProfile, Roi, RoiAnalyzer, RoiBounds};

pub use overlay::{DisplayImage, OverlayRenderer};

pub use params::{
    AcquisitionParameters, ControlEvent, ControlPanel, ParameterChanged, SharedParameters,
    control_channel,
};

pub use export::{ExportConfig, ExportConfigBuilder, Exporter, TiffCompression};

pub use update_loop::{
    CycleOutput, FrameSink, LatestFrameSink, LoopConfig, LoopConfigBuilder, LoopHandle,
    LoopReport, UpdateLoop,
};
