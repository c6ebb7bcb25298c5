use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use roi_monitor_rs::logger::{self, error, info, warn};
use roi_monitor_rs::roi_pipeline::camera::{CameraBackend, SyntheticBackend, SyntheticOptions};
use roi_monitor_rs::roi_pipeline::update_loop::{ExportKind, ExportNotice};
use roi_monitor_rs::roi_pipeline::{
    AcquisitionParameters, CameraSession, ControlPanel, CycleOutput, ExportConfig,
    LatestFrameSink, LoopConfig, RoiBounds, SensorConfig, SharedParameters, TiffCompression,
    UpdateLoop, control_channel,
};

/// Live ROI intensity monitor for the slit camera
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Use the built-in synthetic camera instead of a real device
    #[arg(long)]
    simulate: bool,

    /// Capture device index
    #[arg(long, default_value_t = 0)]
    device: u32,

    /// Cycles to run before exiting, counting failed ones (0 runs until the camera is lost)
    #[arg(long, default_value_t = 200)]
    cycles: u64,

    /// Delay between cycles in milliseconds
    #[arg(long, default_value_t = 50)]
    period_ms: u64,

    #[arg(long)]
    roi_center: Option<u32>,

    #[arg(long)]
    roi_half_height: Option<u32>,

    #[arg(long)]
    brightness: Option<u32>,

    #[arg(long)]
    gain: Option<u32>,

    /// Fail cycles whose ROI band leaves the sensor instead of clipping it
    #[arg(long)]
    strict_roi: bool,

    /// Write the final intensity profile here
    #[arg(long)]
    profile_out: Option<PathBuf>,

    /// Write the final full-resolution frame here as 16-bit TIFF
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Write the final downscaled preview here as 8-bit TIFF
    #[arg(long)]
    preview_out: Option<PathBuf>,

    /// Fractional digits in the profile file
    #[arg(long, default_value_t = 6)]
    precision: usize,

    /// LZW-compress TIFF output
    #[arg(long)]
    lzw: bool,

    /// Synthetic camera: drop every n-th frame
    #[arg(long)]
    drop_every: Option<u64>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_with_level(&args.log_level);

    info!("Starting roi-monitor...");

    if args.simulate {
        let backend = SyntheticBackend::new(SyntheticOptions {
            drop_every: args.drop_every,
            ..Default::default()
        });
        return run(&backend, &args);
    }

    #[cfg(feature = "v4l")]
    {
        run(&roi_monitor_rs::roi_pipeline::camera::V4lBackend, &args)
    }

    #[cfg(not(feature = "v4l"))]
    {
        bail!("built without camera support; rebuild with --features v4l or pass --simulate")
    }
}

fn run<B>(backend: &B, args: &Args) -> anyhow::Result<()>
where
    B: CameraBackend,
    B::Device: 'static,
{
    let sensor = SensorConfig::builder().device_index(args.device).build();
    let session = CameraSession::open(backend, sensor).context("Unable to open camera")?;

    let export_config = ExportConfig::builder()
        .precision(args.precision)
        .compression(if args.lzw {
            TiffCompression::Lzw
        } else {
            TiffCompression::None
        })
        .build();

    let loop_config = LoopConfig::builder()
        .period(Duration::from_millis(args.period_ms))
        .roi_bounds(if args.strict_roi {
            RoiBounds::Strict
        } else {
            RoiBounds::Clamp
        })
        .build();

    let params = SharedParameters::new(AcquisitionParameters::default());
    let (panel, events) = control_channel(params.clone());
    let sink = LatestFrameSink::new();

    apply_overrides(&panel, args)?;

    let handle = UpdateLoop::new(session, params, events, sink.clone(), loop_config)
        .with_export_config(export_config)
        .spawn()
        .context("Unable to start update loop")?;

    info!(cycles = args.cycles, period_ms = args.period_ms, "Acquisition running");
    let last = watch(&sink, args, || handle.is_finished());

    if let Some(output) = &last {
        request_exports(&panel, &sink, args, output.sequence);
    }

    // the loop may already have stopped on its own
    let _ = panel.shutdown();
    let report = handle
        .join()
        .map_err(|_| anyhow!("update loop thread panicked"))?;

    info!(
        completed = report.cycles_completed,
        failed = report.cycles_failed,
        "Acquisition finished"
    );
    if let Some(err) = &report.last_error {
        warn!("Last cycle error: {}", err);
    }

    if last.is_none() && has_exports(args) {
        warn!("No frame was processed, nothing exported");
    }

    if report.cycles_completed == 0 {
        bail!("no cycle completed successfully");
    }
    Ok(())
}

fn apply_overrides(panel: &ControlPanel, args: &Args) -> anyhow::Result<()> {
    if let Some(value) = args.roi_center {
        panel.set_roi_center(value)?;
    }
    if let Some(value) = args.roi_half_height {
        panel.set_roi_half_height(value)?;
    }
    if let Some(value) = args.brightness {
        panel.set_brightness(value)?;
    }
    if let Some(value) = args.gain {
        panel.set_gain(value)?;
    }
    Ok(())
}

fn has_exports(args: &Args) -> bool {
    args.profile_out.is_some() || args.snapshot_out.is_some() || args.preview_out.is_some()
}

/// Follows the loop until `--cycles` cycles were attempted or the loop stops on its own.
fn watch(
    sink: &LatestFrameSink,
    args: &Args,
    finished: impl Fn() -> bool,
) -> Option<CycleOutput> {
    let poll = Duration::from_millis(args.period_ms.clamp(1, 20));
    let mut last: Option<CycleOutput> = None;
    let mut reported_error = None;

    loop {
        if let Some(output) = sink.frames().take() {
            last = Some(output);
        }
        if let Some(err) = sink.last_error().take() {
            if reported_error.as_ref() != Some(&err) {
                warn!("Cycle failed: {}", err);
            }
            reported_error = Some(err);
        }
        let limit_reached = args.cycles > 0 && sink.cycles_seen() >= args.cycles;
        if limit_reached || finished() {
            // pick up a frame published since the last poll
            if let Some(output) = sink.frames().take() {
                last = Some(output);
            }
            break;
        }
        thread::sleep(poll);
    }

    if sink.frames().overwritten() > 0 {
        info!(
            skipped = sink.frames().overwritten(),
            "Frames replaced before display"
        );
    }
    last
}

fn request_exports(panel: &ControlPanel, sink: &LatestFrameSink, args: &Args, sequence: u64) {
    let requests = [
        (args.profile_out.as_ref(), ExportKind::Profile),
        (args.snapshot_out.as_ref(), ExportKind::Snapshot),
        (args.preview_out.as_ref(), ExportKind::Preview),
    ];

    for (path, kind) in requests {
        let Some(path) = path else {
            continue;
        };
        let sent = match kind {
            ExportKind::Profile => panel.save_profile(path.clone()),
            ExportKind::Snapshot => panel.save_snapshot(path.clone()),
            ExportKind::Preview => panel.save_preview(path.clone()),
        };
        if let Err(e) = sent {
            error!("Unable to request export of cycle {}: {}", sequence, e);
            continue;
        }
        match wait_for_notice(sink, Duration::from_secs(5)) {
            Some(ExportNotice { error: None, path, .. }) => {
                info!("Exported {}", path.display())
            }
            Some(ExportNotice {
                error: Some(e), path, ..
            }) => error!("Export to {} failed: {}", path.display(), e),
            None => error!("Export to {} was not acknowledged", path.display()),
        }
    }
}

fn wait_for_notice(sink: &LatestFrameSink, timeout: Duration) -> Option<ExportNotice> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(notice) = sink.notices().take() {
            return Some(notice);
        }
        thread::sleep(Duration::from_millis(2));
    }
    None
}
