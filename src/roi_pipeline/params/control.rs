//! Control surface handed to the UI collaborator.
//!
//! Sliders and buttons never touch pipeline state directly. They send `ControlEvent`s that
//! the update loop drains at the start of each cycle.

use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::roi_pipeline::common::error::{MonitorError, Result};
use crate::roi_pipeline::params::parameters::{
    AcquisitionParameters, ParameterChanged, SharedParameters,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    Parameter(ParameterChanged),
    /// Write the latest profile to a text file
    SaveProfile(PathBuf),
    /// Write the latest intensity matrix as a 16-bit TIFF
    SaveSnapshot(PathBuf),
    /// Write the latest downscaled preview as an 8-bit TIFF
    SavePreview(PathBuf),
    Shutdown,
}

/// Creates the control channel for a parameter record.
pub fn control_channel(params: SharedParameters) -> (ControlPanel, Receiver<ControlEvent>) {
    let (tx, rx) = unbounded();
    (ControlPanel { tx, params }, rx)
}

/// Cloneable handle through which the UI drives the update loop.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    tx: Sender<ControlEvent>,
    params: SharedParameters,
}

impl ControlPanel {
    pub fn set_roi_center(&self, value: u32) -> Result<()> {
        self.change(ParameterChanged::RoiCenter(value))
    }

    pub fn set_roi_half_height(&self, value: u32) -> Result<()> {
        self.change(ParameterChanged::RoiHalfHeight(value))
    }

    pub fn set_brightness(&self, value: u32) -> Result<()> {
        self.change(ParameterChanged::Brightness(value))
    }

    pub fn set_gain(&self, value: u32) -> Result<()> {
        self.change(ParameterChanged::Gain(value))
    }

    /// Validates up front so the UI can reject a value without waiting for the loop.
    pub fn change(&self, change: ParameterChanged) -> Result<()> {
        change.validate()?;
        self.send(ControlEvent::Parameter(change))
    }

    pub fn save_profile(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(ControlEvent::SaveProfile(path.into()))
    }

    pub fn save_snapshot(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(ControlEvent::SaveSnapshot(path.into()))
    }

    pub fn save_preview(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(ControlEvent::SavePreview(path.into()))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(ControlEvent::Shutdown)
    }

    /// Latest committed values, for slider labels
    pub fn current(&self) -> AcquisitionParameters {
        self.params.snapshot()
    }

    fn send(&self, event: ControlEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| MonitorError::LoopStopped)
    }
}
