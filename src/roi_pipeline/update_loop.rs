//! Update loop module
//!
//! Schedules the acquisition cycle and hands results to the UI collaborator.

mod handoff;
mod scheduler;
mod sink;
mod timing;
pub mod types;

#[cfg(test)]
mod tests;

pub use handoff::LatestSlot;
pub use scheduler::{LoopHandle, UpdateLoop};
pub use sink::{ExportKind, ExportNotice, FrameSink, LatestFrameSink};
pub use timing::{CycleTimings, StageTiming, Timer, TimingSummary};
pub use types::{CycleOutput, LoopConfig, LoopConfigBuilder, LoopFlow, LoopReport, LoopState};
