use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::roi_pipeline::common::error::{MonitorError, Result};
use crate::roi_pipeline::update_loop::handoff::LatestSlot;
use crate::roi_pipeline::update_loop::types::CycleOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Profile,
    /// Full-resolution 16-bit matrix
    Snapshot,
    /// Downscaled 8-bit display image
    Preview,
}

/// Outcome of a save request, as shown to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNotice {
    pub kind: ExportKind,
    pub path: PathBuf,
    /// `None` on success, otherwise the failure message
    pub error: Option<String>,
}

/// The UI collaborator's side of the loop.
///
/// Called from the loop thread after every cycle; implementations must return quickly
/// because the next cycle is not scheduled until `publish` returns.
pub trait FrameSink: Send {
    fn publish(&mut self, output: &CycleOutput);

    fn cycle_failed(&mut self, _error: &MonitorError) {}

    fn export_finished(&mut self, _kind: ExportKind, _path: &Path, _result: &Result<()>) {}

    /// Called once when the loop stops
    fn close(&mut self) {}
}

/// Sink that parks the newest output in a `LatestSlot` for another thread to collect.
///
/// Also counts every cycle the loop attempted, successful or not, so a watcher can stop
/// after a fixed number of cycles even when none of them produce a frame.
#[derive(Debug, Clone, Default)]
pub struct LatestFrameSink {
    frames: LatestSlot<CycleOutput>,
    notices: LatestSlot<ExportNotice>,
    last_error: LatestSlot<String>,
    cycles: Arc<AtomicU64>,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &LatestSlot<CycleOutput> {
        &self.frames
    }

    pub fn notices(&self) -> &LatestSlot<ExportNotice> {
        &self.notices
    }

    pub fn last_error(&self) -> &LatestSlot<String> {
        &self.last_error
    }

    /// Cycles published or failed so far
    pub fn cycles_seen(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }
}

impl FrameSink for LatestFrameSink {
    fn publish(&mut self, output: &CycleOutput) {
        self.frames.put(output.clone());
        self.cycles.fetch_add(1, Ordering::Release);
    }

    fn cycle_failed(&mut self, error: &MonitorError) {
        self.last_error.put(error.to_string());
        self.cycles.fetch_add(1, Ordering::Release);
    }

    fn export_finished(&mut self, kind: ExportKind, path: &Path, result: &Result<()>) {
        self.notices.put(ExportNotice {
            kind,
            path: path.to_path_buf(),
            error: result.as_ref().err().map(|e| e.to_string()),
        });
    }
}
