use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::roi_pipeline::camera::synthetic_device::pack_sample;
use crate::roi_pipeline::camera::{
    CameraBackend, CameraDevice, CameraSession, DeviceProperty, RawFrame, SensorConfig,
};
use crate::roi_pipeline::common::error::{MonitorError, Result};
use crate::roi_pipeline::params::{
    AcquisitionParameters, ControlPanel, SharedParameters, control_channel,
};
use crate::roi_pipeline::update_loop::{
    CycleOutput, ExportKind, FrameSink, LatestFrameSink, LoopConfig, LoopFlow, LoopState,
    UpdateLoop,
};

const WIDTH: usize = 20;
const HEIGHT: usize = 10;

#[derive(Default)]
struct DeviceLog {
    writes: Vec<(DeviceProperty, f64)>,
    reads: usize,
    releases: usize,
}

/// Replays a script of reads, then keeps returning a uniform frame, or reports the camera
/// gone when `lost` is set.
struct ScriptedDevice {
    log: Arc<Mutex<DeviceLog>>,
    script: VecDeque<Option<Vec<u8>>>,
    fallback: Vec<u8>,
    lost: bool,
}

impl CameraDevice for ScriptedDevice {
    fn set_property(&mut self, property: DeviceProperty, value: f64) -> Result<()> {
        self.log.lock().unwrap().writes.push((property, value));
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        self.log.lock().unwrap().reads += 1;
        let data = match self.script.pop_front() {
            Some(entry) => entry,
            None if self.lost => {
                return Err(MonitorError::DeviceUnavailable("cable pulled".to_string()));
            }
            None => Some(self.fallback.clone()),
        };
        Ok(data.map(RawFrame::new))
    }

    fn release(&mut self) {
        self.log.lock().unwrap().releases += 1;
    }
}

struct ScriptedBackend {
    log: Arc<Mutex<DeviceLog>>,
    script: Vec<Option<Vec<u8>>>,
    value: u16,
    lost: bool,
}

impl ScriptedBackend {
    fn uniform(value: u16) -> Self {
        Self {
            log: Arc::new(Mutex::new(DeviceLog::default())),
            script: Vec::new(),
            value,
            lost: false,
        }
    }

    fn with_script(mut self, script: Vec<Option<Vec<u8>>>) -> Self {
        self.script = script;
        self
    }

    fn lost_after_script(mut self) -> Self {
        self.lost = true;
        self
    }

    fn writes_of(&self, property: DeviceProperty) -> Vec<f64> {
        self.log
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|(p, _)| *p == property)
            .map(|(_, v)| *v)
            .collect()
    }

    fn releases(&self) -> usize {
        self.log.lock().unwrap().releases
    }
}

impl CameraBackend for ScriptedBackend {
    type Device = ScriptedDevice;

    fn open(&self, _index: u32) -> Result<ScriptedDevice> {
        Ok(ScriptedDevice {
            log: self.log.clone(),
            script: self.script.iter().cloned().collect(),
            fallback: uniform_frame(self.value),
            lost: self.lost,
        })
    }
}

fn uniform_frame(value: u16) -> Vec<u8> {
    std::iter::repeat_n(pack_sample(value), WIDTH * HEIGHT)
        .flatten()
        .collect()
}

/// Records everything the loop hands out.
#[derive(Clone, Default)]
struct RecordingSink {
    outputs: Arc<Mutex<Vec<CycleOutput>>>,
    errors: Arc<Mutex<Vec<String>>>,
    exports: Arc<Mutex<Vec<(ExportKind, bool)>>>,
    closed: Arc<Mutex<usize>>,
}

impl FrameSink for RecordingSink {
    fn publish(&mut self, output: &CycleOutput) {
        self.outputs.lock().unwrap().push(output.clone());
    }

    fn cycle_failed(&mut self, error: &MonitorError) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn export_finished(&mut self, kind: ExportKind, _path: &Path, result: &Result<()>) {
        self.exports.lock().unwrap().push((kind, result.is_ok()));
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() += 1;
    }
}

fn small_sensor() -> SensorConfig {
    SensorConfig::builder().geometry(WIDTH, HEIGHT).build()
}

fn in_frame_params() -> AcquisitionParameters {
    AcquisitionParameters {
        roi_center: 5,
        roi_half_height: 2,
        ..Default::default()
    }
}

fn build_loop<S: FrameSink>(
    backend: &ScriptedBackend,
    sink: S,
    config: LoopConfig,
) -> (UpdateLoop<ScriptedDevice, S>, ControlPanel, SharedParameters) {
    let session = CameraSession::open(backend, small_sensor()).unwrap();
    let params = SharedParameters::new(in_frame_params());
    let (panel, events) = control_channel(params.clone());
    let update_loop = UpdateLoop::new(session, params.clone(), events, sink, config);
    (update_loop, panel, params)
}

fn quick_config(max_cycles: u64) -> LoopConfig {
    LoopConfig::builder()
        .period(Duration::from_millis(1))
        .max_cycles(Some(max_cycles))
        .build()
}

#[test]
fn test_cycle_publishes_profile_and_preview() {
    let backend = ScriptedBackend::uniform(1000);
    let sink = RecordingSink::default();
    let (update_loop, _panel, _) = build_loop(&backend, sink.clone(), quick_config(1));

    let report = update_loop.run();

    assert_eq!(report.cycles_completed, 1);
    let outputs = sink.outputs.lock().unwrap();
    let output = &outputs[0];
    assert_eq!(output.sequence, 1);
    assert_eq!(output.profile.len(), WIDTH);
    assert!(output.profile.values().iter().all(|&v| v == 1000.0));
    assert_eq!((output.display.width, output.display.height), (8, 4));
    for stage in ["capture", "decode", "analyze", "render"] {
        assert!(output.timings.get_stage(stage).is_some(), "{stage}");
    }
}

#[test]
fn test_missing_frames_do_not_stall_the_loop() {
    let backend = ScriptedBackend::uniform(200).with_script(vec![None, None]);
    let sink = RecordingSink::default();
    let (update_loop, _panel, _) = build_loop(&backend, sink.clone(), quick_config(5));

    let report = update_loop.run();

    assert_eq!(report.cycles_failed, 2);
    assert_eq!(report.cycles_completed, 3);
    assert_eq!(sink.outputs.lock().unwrap().len(), 3);
    assert_eq!(sink.errors.lock().unwrap().len(), 2);
}

#[test]
fn test_malformed_frame_is_reported_and_skipped() {
    let backend = ScriptedBackend::uniform(200).with_script(vec![Some(vec![0x10, 0x80, 0x20])]);
    let sink = RecordingSink::default();
    let (update_loop, _panel, _) = build_loop(&backend, sink.clone(), quick_config(2));

    let report = update_loop.run();

    assert_eq!((report.cycles_failed, report.cycles_completed), (1, 1));
    assert!(sink.errors.lock().unwrap()[0].contains("Malformed raw frame"));
    assert!(report.last_error.is_some());
}

#[test]
fn test_gain_change_reaches_device_once() {
    let backend = ScriptedBackend::uniform(200);
    let sink = RecordingSink::default();
    let (update_loop, panel, params) = build_loop(&backend, sink.clone(), quick_config(1));

    panel.set_gain(16).unwrap();
    panel.set_roi_center(4).unwrap();
    update_loop.run();

    // initial configuration write, then the operator change
    assert_eq!(backend.writes_of(DeviceProperty::Gain), vec![8.0, 16.0]);
    assert_eq!(backend.writes_of(DeviceProperty::Brightness), vec![300.0]);
    assert_eq!(params.snapshot().gain, 16);

    let outputs = sink.outputs.lock().unwrap();
    assert_eq!(outputs[0].params.gain, 16);
    assert_eq!(outputs[0].params.roi_center, 4);
}

#[test]
fn test_shutdown_before_start_releases_everything() {
    let backend = ScriptedBackend::uniform(200);
    let sink = RecordingSink::default();
    let (update_loop, panel, _) = build_loop(&backend, sink.clone(), LoopConfig::default());

    panel.shutdown().unwrap();
    let report = update_loop.run();

    assert_eq!(report.cycles_attempted(), 0);
    assert_eq!(backend.releases(), 1);
    assert_eq!(*sink.closed.lock().unwrap(), 1);
    assert!(matches!(panel.set_gain(3), Err(MonitorError::LoopStopped)));
}

#[test]
fn test_roi_off_sensor_recovers_after_change() {
    let backend = ScriptedBackend::uniform(300);
    let sink = RecordingSink::default();
    let (mut update_loop, panel, _) = build_loop(&backend, sink.clone(), LoopConfig::default());

    panel.set_roi_center(900).unwrap();
    assert_eq!(update_loop.run_once(), LoopFlow::Continue);
    assert!(sink.errors.lock().unwrap()[0].contains("ROI out of range"));

    panel.set_roi_center(5).unwrap();
    assert_eq!(update_loop.run_once(), LoopFlow::Continue);
    assert_eq!(sink.outputs.lock().unwrap().len(), 1);
    assert_eq!(update_loop.state(), LoopState::Running);

    update_loop.shutdown();
    assert_eq!(update_loop.state(), LoopState::Stopped);
    assert_eq!(update_loop.run_once(), LoopFlow::Stop);
}

#[test]
fn test_save_requests_export_latest_results() {
    let dir = tempfile::tempdir().unwrap();
    let profile_path = dir.path().join("profile.txt");
    let snapshot_path = dir.path().join("frame.tiff");

    let backend = ScriptedBackend::uniform(640);
    let sink = RecordingSink::default();
    let (mut update_loop, panel, _) = build_loop(&backend, sink.clone(), LoopConfig::default());

    // nothing captured yet
    panel.save_profile(&profile_path).unwrap();
    update_loop.run_once();

    panel.save_profile(&profile_path).unwrap();
    panel.save_snapshot(&snapshot_path).unwrap();
    update_loop.run_once();

    assert_eq!(
        *sink.exports.lock().unwrap(),
        vec![
            (ExportKind::Profile, false),
            (ExportKind::Profile, true),
            (ExportKind::Snapshot, true),
        ]
    );

    let text = std::fs::read_to_string(&profile_path).unwrap();
    assert_eq!(text.lines().count(), WIDTH);
    assert!(text.lines().all(|line| line == "640.000000"));
    assert!(std::fs::metadata(&snapshot_path).unwrap().len() > 0);
}

#[test]
fn test_failed_export_does_not_stop_acquisition() {
    let backend = ScriptedBackend::uniform(10);
    let sink = RecordingSink::default();
    let (mut update_loop, panel, _) = build_loop(&backend, sink.clone(), LoopConfig::default());

    update_loop.run_once();
    panel.save_profile("/nonexistent-dir/profile.txt").unwrap();
    assert_eq!(update_loop.run_once(), LoopFlow::Continue);

    assert_eq!(*sink.exports.lock().unwrap(), vec![(ExportKind::Profile, false)]);
    assert_eq!(sink.outputs.lock().unwrap().len(), 2);
}

#[test]
fn test_cycles_are_spaced_by_period() {
    let backend = ScriptedBackend::uniform(10);
    let config = LoopConfig::builder()
        .period(Duration::from_millis(20))
        .max_cycles(Some(3))
        .build();
    let (update_loop, _panel, _) = build_loop(&backend, RecordingSink::default(), config);

    let started = Instant::now();
    let report = update_loop.run();

    assert_eq!(report.cycles_completed, 3);
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[test]
fn test_spawned_loop_stops_on_shutdown() {
    let backend = ScriptedBackend::uniform(123);
    let sink = LatestFrameSink::new();
    let config = LoopConfig::builder().period(Duration::from_millis(2)).build();
    let (update_loop, panel, _) = build_loop(&backend, sink.clone(), config);

    let handle = update_loop.spawn().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let first = loop {
        if let Some(output) = sink.frames().take() {
            break output;
        }
        assert!(Instant::now() < deadline, "no frame published");
        std::thread::sleep(Duration::from_millis(1));
    };
    assert!(first.profile.values().iter().all(|&v| v == 123.0));

    panel.shutdown().unwrap();
    let report = handle.join().unwrap();

    assert!(report.cycles_completed >= 1);
    assert_eq!(backend.releases(), 1);
}

#[test]
fn test_dropping_every_panel_stops_loop() {
    let backend = ScriptedBackend::uniform(1);
    let config = LoopConfig::builder().period(Duration::from_millis(2)).build();
    let (update_loop, panel, _) = build_loop(&backend, RecordingSink::default(), config);

    let handle = update_loop.spawn().unwrap();
    drop(panel);

    let report = handle.join().unwrap();
    assert!(report.cycles_attempted() >= 1);
    assert_eq!(backend.releases(), 1);
}

#[test]
fn test_preview_request_writes_display_image() {
    let dir = tempfile::tempdir().unwrap();
    let preview_path = dir.path().join("preview.tiff");

    let backend = ScriptedBackend::uniform(2048);
    let sink = RecordingSink::default();
    let (mut update_loop, panel, _) = build_loop(&backend, sink.clone(), LoopConfig::default());

    update_loop.run_once();
    panel.save_preview(&preview_path).unwrap();
    update_loop.run_once();

    assert_eq!(*sink.exports.lock().unwrap(), vec![(ExportKind::Preview, true)]);

    let file = std::fs::File::open(&preview_path).unwrap();
    let mut decoder = tiff::decoder::Decoder::new(std::io::BufReader::new(file)).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (8, 4));
    match decoder.read_image().unwrap() {
        tiff::decoder::DecodingResult::U8(values) => {
            assert!(values.iter().all(|&v| v <= 254));
        }
        _ => panic!("expected 8-bit samples"),
    }
}

#[test]
fn test_lost_camera_stops_loop() {
    let frame = uniform_frame(50);
    let backend = ScriptedBackend::uniform(50)
        .with_script(vec![Some(frame.clone()), None, Some(frame)])
        .lost_after_script();
    let sink = RecordingSink::default();
    let config = LoopConfig::builder().period(Duration::from_millis(1)).build();
    let (update_loop, _panel, _) = build_loop(&backend, sink.clone(), config);

    let report = update_loop.run();

    assert_eq!(report.cycles_completed, 2);
    // one dropped frame, then the lost device
    assert_eq!(report.cycles_failed, 2);
    assert!(report.last_error.unwrap().contains("Camera device unavailable"));
    assert_eq!(backend.releases(), 1);
    assert_eq!(*sink.closed.lock().unwrap(), 1);
}

#[test]
fn test_failed_cycles_count_toward_progress() {
    let backend = ScriptedBackend::uniform(80);
    let sink = LatestFrameSink::new();
    let config = LoopConfig::builder().period(Duration::from_millis(1)).build();
    let (update_loop, panel, _) = build_loop(&backend, sink.clone(), config);

    // every cycle fails: the band lies below the 10-row frame
    panel.set_roi_center(900).unwrap();
    let handle = update_loop.spawn().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while sink.cycles_seen() < 3 {
        assert!(Instant::now() < deadline, "failed cycles were not counted");
        std::thread::sleep(Duration::from_millis(1));
    }
    panel.shutdown().unwrap();
    let report = handle.join().unwrap();

    assert_eq!(report.cycles_completed, 0);
    assert!(report.cycles_failed >= 3);
    assert!(sink.frames().take().is_none());
    assert!(sink.last_error().take().unwrap().contains("ROI out of range"));
}
