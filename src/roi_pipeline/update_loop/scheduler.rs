//! Periodic capture → decode → analyze → render → publish cycle.
//!
//! Cycles never overlap: the next one starts `period` after the previous publish returned.
//! Control events queue up while the loop waits and are applied, in order, at the start of
//! the next cycle. A cycle that fails (no frame, malformed frame, ROI off the sensor) is
//! logged and reported to the sink, and the loop keeps its schedule.

use std::collections::VecDeque;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, debug_span, info, warn};

use crate::roi_pipeline::analysis::RoiAnalyzer;
use crate::roi_pipeline::camera::{CameraDevice, CameraSession};
use crate::roi_pipeline::common::error::{MonitorError, Result};
use crate::roi_pipeline::decode::{IntensityMatrix, PackedDecoder};
use crate::roi_pipeline::export::{ExportConfig, Exporter, TiffSnapshotWriter};
use crate::roi_pipeline::overlay::OverlayRenderer;
use crate::roi_pipeline::params::{
    AcquisitionParameters, ControlEvent, ParameterChanged, SharedParameters,
};
use crate::roi_pipeline::update_loop::sink::{ExportKind, FrameSink};
use crate::roi_pipeline::update_loop::timing::{CycleTimings, Timer, TimingSummary};
use crate::roi_pipeline::update_loop::types::{
    CycleOutput, LoopConfig, LoopFlow, LoopReport, LoopState,
};

/// Result of the most recent successful cycle, kept for export requests
struct LatestFrame {
    matrix: IntensityMatrix,
    output: CycleOutput,
}

pub struct UpdateLoop<D: CameraDevice, S: FrameSink> {
    session: Option<CameraSession<D>>,
    decoder: PackedDecoder,
    analyzer: RoiAnalyzer,
    renderer: OverlayRenderer,
    exporter: Exporter<TiffSnapshotWriter>,
    params: SharedParameters,
    events: Receiver<ControlEvent>,
    pending: VecDeque<ControlEvent>,
    sink: S,
    config: LoopConfig,
    state: LoopState,
    sequence: u64,
    latest: Option<LatestFrame>,
    report: LoopReport,
    summary: TimingSummary,
}

impl<D: CameraDevice, S: FrameSink> UpdateLoop<D, S> {
    pub fn new(
        session: CameraSession<D>,
        params: SharedParameters,
        events: Receiver<ControlEvent>,
        sink: S,
        config: LoopConfig,
    ) -> Self {
        let decoder = PackedDecoder::new(session.config().width, session.config().height);
        Self {
            session: Some(session),
            decoder,
            analyzer: RoiAnalyzer::new(config.roi_bounds),
            renderer: OverlayRenderer::new(config.display_scale, config.outline_thickness),
            exporter: Exporter::default(),
            params,
            events,
            pending: VecDeque::new(),
            sink,
            config,
            state: LoopState::Idle,
            sequence: 0,
            latest: None,
            report: LoopReport::default(),
            summary: TimingSummary::default(),
        }
    }

    pub fn with_export_config(mut self, config: ExportConfig) -> Self {
        self.exporter = Exporter::new(config);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn report(&self) -> &LoopReport {
        &self.report
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs until a shutdown event arrives, every `ControlPanel` is dropped, or the cycle
    /// limit is reached. The device is released before returning.
    pub fn run(mut self) -> LoopReport {
        info!(period_ms = self.config.period.as_millis() as u64, "Update loop starting");

        while self.run_once() == LoopFlow::Continue {
            if self.limit_reached() {
                info!(cycles = self.report.cycles_attempted(), "Cycle limit reached");
                break;
            }
            self.wait_for_next_tick();
        }

        self.shutdown();
        std::mem::take(&mut self.report)
    }

    /// Runs the loop on a dedicated thread.
    pub fn spawn(self) -> Result<LoopHandle>
    where
        D: 'static,
        S: 'static,
    {
        let handle = thread::Builder::new()
            .name("update-loop".to_string())
            .spawn(move || self.run())?;
        Ok(LoopHandle { handle })
    }

    /// Applies queued control events, then performs one cycle.
    ///
    /// Embedders with their own timer call this once per tick instead of `run`.
    pub fn run_once(&mut self) -> LoopFlow {
        if self.state == LoopState::Stopped {
            return LoopFlow::Stop;
        }
        if self.state == LoopState::Idle {
            self.state = LoopState::Running;
            debug!("Update loop running");
        }

        if self.drain_events() == LoopFlow::Stop {
            return LoopFlow::Stop;
        }
        self.tick()
    }

    fn limit_reached(&self) -> bool {
        self.config
            .max_cycles
            .is_some_and(|max| self.report.cycles_attempted() >= max)
    }

    fn wait_for_next_tick(&mut self) {
        let deadline = Instant::now() + self.config.period;
        loop {
            match self.events.recv_deadline(deadline) {
                Ok(ControlEvent::Shutdown) => {
                    self.pending.push_back(ControlEvent::Shutdown);
                    return;
                }
                Ok(event) => self.pending.push_back(event),
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("All control handles dropped");
                    self.pending.push_back(ControlEvent::Shutdown);
                    return;
                }
            }
        }
    }

    fn drain_events(&mut self) -> LoopFlow {
        self.pending.extend(self.events.try_iter());

        while let Some(event) = self.pending.pop_front() {
            match event {
                ControlEvent::Parameter(change) => self.apply_change(change),
                ControlEvent::SaveProfile(path) => self.export(ExportKind::Profile, &path),
                ControlEvent::SaveSnapshot(path) => self.export(ExportKind::Snapshot, &path),
                ControlEvent::SavePreview(path) => self.export(ExportKind::Preview, &path),
                ControlEvent::Shutdown => {
                    info!("Shutdown requested");
                    self.pending.clear();
                    return LoopFlow::Stop;
                }
            }
        }
        LoopFlow::Continue
    }

    fn apply_change(&mut self, change: ParameterChanged) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = self.params.commit(change, session) {
            warn!(?change, error = %e, "Parameter change not fully applied");
        }
    }

    fn export(&mut self, kind: ExportKind, path: &Path) {
        let result = match (&self.latest, kind) {
            (None, _) => Err(MonitorError::ExportError(
                "no frame has been processed yet".to_string(),
            )),
            (Some(latest), ExportKind::Profile) => {
                self.exporter.save_profile(path, &latest.output.profile)
            }
            (Some(latest), ExportKind::Snapshot) => {
                self.exporter.save_matrix(path, &latest.matrix)
            }
            (Some(latest), ExportKind::Preview) => {
                self.exporter.save_display(path, &latest.output.display)
            }
        };

        if let Err(e) = &result {
            warn!(?kind, path = %path.display(), error = %e, "Export failed");
        }
        self.sink.export_finished(kind, path, &result);
    }

    fn tick(&mut self) -> LoopFlow {
        let params = self.params.snapshot();
        self.sequence += 1;
        let _span = debug_span!("cycle", seq = self.sequence).entered();

        match self.run_cycle(params) {
            Ok(()) => {
                self.report.cycles_completed += 1;
                LoopFlow::Continue
            }
            Err(e) => {
                self.report.cycles_failed += 1;
                self.report.last_error = Some(e.to_string());
                self.sink.cycle_failed(&e);

                if e.is_recoverable() {
                    warn!(error = %e, "Cycle failed, retrying next tick");
                    LoopFlow::Continue
                } else {
                    warn!(error = %e, "Cycle failed, stopping");
                    LoopFlow::Stop
                }
            }
        }
    }

    fn run_cycle(&mut self, params: AcquisitionParameters) -> Result<()> {
        let mut timings = CycleTimings::new();
        let roi = params.roi();

        let session = self.session.as_mut().ok_or_else(|| {
            MonitorError::DeviceUnavailable("camera session closed".to_string())
        })?;

        let timer = Timer::start("capture");
        let frame = session.capture()?;
        timings.record(timer);

        let timer = Timer::start("decode");
        let matrix = self.decoder.decode(&frame)?;
        timings.record(timer);

        let timer = Timer::start("analyze");
        let profile = self.analyzer.analyze(&matrix, roi)?;
        timings.record(timer);

        let timer = Timer::start("render");
        let display = self.renderer.render(&matrix, roi);
        timings.record(timer);

        let output = CycleOutput {
            sequence: self.sequence,
            params,
            profile,
            display,
            captured_at: frame.captured_at,
            timings,
        };

        let timer = Timer::start("publish");
        self.sink.publish(&output);
        let (name, duration) = timer.stop();

        self.summary.add(&output.timings);
        self.summary.add_stage(name, duration);
        debug!(
            total_ms = output.timings.total_duration().as_secs_f64() * 1000.0,
            "Cycle complete"
        );

        self.latest = Some(LatestFrame { matrix, output });
        Ok(())
    }

    /// Stops scheduling, closes the sink and releases the camera. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::Stopped;
        self.sink.close();
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.summary.log();
        info!(
            completed = self.report.cycles_completed,
            failed = self.report.cycles_failed,
            "Update loop stopped"
        );
    }
}

impl<D: CameraDevice, S: FrameSink> Drop for UpdateLoop<D, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to a loop running on its own thread
pub struct LoopHandle {
    handle: JoinHandle<LoopReport>,
}

impl LoopHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the loop to stop. A panic on the loop thread is returned as `Err`.
    pub fn join(self) -> thread::Result<LoopReport> {
        self.handle.join()
    }
}
