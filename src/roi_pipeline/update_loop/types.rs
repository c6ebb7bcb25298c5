//! Update loop configuration and result types

use std::time::{Duration, Instant};

use crate::roi_pipeline::analysis::{IntensityProfile, RoiBounds};
use crate::roi_pipeline::overlay::DisplayImage;
use crate::roi_pipeline::params::AcquisitionParameters;
use crate::roi_pipeline::update_loop::timing::CycleTimings;

/// Lifecycle of an update loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Whether the loop should schedule another cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFlow {
    Continue,
    Stop,
}

/// Everything one cycle hands to the UI
#[derive(Debug, Clone)]
pub struct CycleOutput {
    /// Monotonic cycle counter, starting at 1
    pub sequence: u64,
    /// Parameters the cycle ran with
    pub params: AcquisitionParameters,
    pub profile: IntensityProfile,
    pub display: DisplayImage,
    pub captured_at: Instant,
    pub timings: CycleTimings,
}

/// Counters returned when the loop stops
#[derive(Debug, Clone, Default)]
pub struct LoopReport {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub last_error: Option<String>,
}

impl LoopReport {
    pub fn cycles_attempted(&self) -> u64 {
        self.cycles_completed + self.cycles_failed
    }
}

/// Configuration for the update loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Delay between the end of one cycle and the start of the next
    pub period: Duration,
    /// How ROI bands reaching past the frame are handled
    pub roi_bounds: RoiBounds,
    /// Stop after this many cycles (successful or not)
    pub max_cycles: Option<u64>,
    /// Preview downscale factor on both axes
    pub display_scale: f64,
    /// ROI outline thickness in full-resolution pixels
    pub outline_thickness: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(50),
            roi_bounds: RoiBounds::Clamp,
            max_cycles: None,
            display_scale: 0.4,
            outline_thickness: 2,
        }
    }
}

impl LoopConfig {
    pub fn builder() -> LoopConfigBuilder {
        LoopConfigBuilder::default()
    }
}

/// Builder for LoopConfig
#[derive(Default)]
pub struct LoopConfigBuilder {
    period: Option<Duration>,
    roi_bounds: Option<RoiBounds>,
    max_cycles: Option<Option<u64>>,
    display_scale: Option<f64>,
    outline_thickness: Option<usize>,
}

impl LoopConfigBuilder {
    pub fn period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    pub fn roi_bounds(mut self, bounds: RoiBounds) -> Self {
        self.roi_bounds = Some(bounds);
        self
    }

    pub fn max_cycles(mut self, max: Option<u64>) -> Self {
        self.max_cycles = Some(max);
        self
    }

    pub fn display_scale(mut self, scale: f64) -> Self {
        self.display_scale = Some(scale);
        self
    }

    pub fn outline_thickness(mut self, thickness: usize) -> Self {
        self.outline_thickness = Some(thickness);
        self
    }

    pub fn build(self) -> LoopConfig {
        let default = LoopConfig::default();
        LoopConfig {
            period: self.period.unwrap_or(default.period),
            roi_bounds: self.roi_bounds.unwrap_or(default.roi_bounds),
            max_cycles: self.max_cycles.unwrap_or(default.max_cycles),
            display_scale: self.display_scale.unwrap_or(default.display_scale),
            outline_thickness: self.outline_thickness.unwrap_or(default.outline_thickness),
        }
    }
}
