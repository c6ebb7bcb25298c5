//! Simulated sensor producing packed raw frames.
//!
//! The simulated scene is a horizontal slit of light dispersed into a handful of emission
//! lines: intensity varies along columns (the spectrum) and falls off away from the slit row.
//! Samples are encoded in the sensor's packed format, so a frame decoded by `PackedDecoder`
//! reproduces the simulated 12-bit values exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::roi_pipeline::camera::device::{CameraBackend, CameraDevice};
use crate::roi_pipeline::camera::types::{
    DeviceProperty, FRAME_HEIGHT, FRAME_WIDTH, RAW_CAPTURE_MODE, RawFrame,
};
use crate::roi_pipeline::common::error::{MonitorError, Result};

/// (column, relative amplitude, width in columns)
const EMISSION_LINES: [(f32, f32, f32); 5] = [
    (180.0, 0.55, 6.0),
    (402.0, 1.00, 4.0),
    (615.0, 0.35, 9.0),
    (870.0, 0.80, 5.0),
    (1104.0, 0.45, 7.0),
];

const DARK_LEVEL: f32 = 64.0;
const MAX_SAMPLE: f32 = 4095.0;

/// Packs a 12-bit value the way the sensor does: high byte carries bits 4..12, low byte
/// carries bits 0..4 offset by 128.
pub fn pack_sample(value: u16) -> [u8; 2] {
    let value = value.min(4095);
    [(value >> 4) as u8, (value & 0x0F) as u8 + 128]
}

#[derive(Debug, Clone)]
pub struct SyntheticOptions {
    /// Row the slit image is centered on
    pub slit_row: f32,
    /// Gaussian half-width of the slit image in rows
    pub slit_sigma: f32,
    /// Peak-to-peak noise amplitude in sample units
    pub noise: u16,
    /// Return no data on every n-th read
    pub drop_every: Option<u64>,
    pub seed: u64,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            slit_row: 500.0,
            slit_sigma: 40.0,
            noise: 12,
            drop_every: None,
            seed: 0x5eed,
        }
    }
}

pub struct SyntheticBackend {
    options: SyntheticOptions,
}

impl SyntheticBackend {
    pub fn new(options: SyntheticOptions) -> Self {
        Self { options }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new(SyntheticOptions::default())
    }
}

impl CameraBackend for SyntheticBackend {
    type Device = SyntheticDevice;

    fn open(&self, index: u32) -> Result<SyntheticDevice> {
        if index != 0 {
            return Err(MonitorError::DeviceUnavailable(format!(
                "synthetic sensor only exists at index 0, requested {index}"
            )));
        }
        info!("Opening synthetic sensor");
        Ok(SyntheticDevice::new(self.options.clone()))
    }
}

pub struct SyntheticDevice {
    options: SyntheticOptions,
    width: usize,
    height: usize,
    brightness: f32,
    gain: f32,
    reads: u64,
    rng: StdRng,
    released: bool,
}

impl SyntheticDevice {
    fn new(options: SyntheticOptions) -> Self {
        let rng = StdRng::seed_from_u64(options.seed);
        Self {
            options,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            brightness: 300.0,
            gain: 8.0,
            reads: 0,
            rng,
            released: false,
        }
    }

    fn spectrum(&self) -> Vec<f32> {
        (0..self.width)
            .map(|col| {
                let x = col as f32;
                EMISSION_LINES
                    .iter()
                    .map(|&(center, amplitude, width)| {
                        let d = (x - center) / width;
                        amplitude * (-0.5 * d * d).exp()
                    })
                    .sum::<f32>()
                    + 0.04
            })
            .collect()
    }

    fn render(&mut self) -> Vec<u8> {
        let spectrum = self.spectrum();
        // brightness 800 at gain 8 puts the strongest line near full scale
        let scale = (self.brightness / 800.0) * (self.gain / 8.0) * (MAX_SAMPLE - DARK_LEVEL);
        let noise = self.options.noise as i32;

        let mut data = Vec::with_capacity(2 * self.width * self.height);
        for row in 0..self.height {
            let d = (row as f32 - self.options.slit_row) / self.options.slit_sigma;
            let envelope = (-0.5 * d * d).exp();
            for &level in &spectrum {
                let jitter = if noise > 0 {
                    self.rng.random_range(-noise / 2..=noise / 2) as f32
                } else {
                    0.0
                };
                let value = (DARK_LEVEL + scale * level * envelope + jitter).clamp(0.0, MAX_SAMPLE);
                data.extend_from_slice(&pack_sample(value as u16));
            }
        }
        data
    }
}

impl CameraDevice for SyntheticDevice {
    fn set_property(&mut self, property: DeviceProperty, value: f64) -> Result<()> {
        match property {
            DeviceProperty::FrameWidth if value >= 1.0 => self.width = value as usize,
            DeviceProperty::FrameHeight if value >= 1.0 => self.height = value as usize,
            DeviceProperty::Mode if value as u32 == RAW_CAPTURE_MODE => {}
            DeviceProperty::ConvertRgb if value == 0.0 => {}
            DeviceProperty::Brightness => self.brightness = value as f32,
            DeviceProperty::Gain => self.gain = value as f32,
            _ => {
                return Err(MonitorError::DeviceWrite(format!(
                    "synthetic sensor does not support {}={}",
                    property.as_str(),
                    value
                )));
            }
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.released {
            return Err(MonitorError::DeviceUnavailable("device released".to_string()));
        }
        self.reads += 1;
        if let Some(n) = self.options.drop_every {
            if n > 0 && self.reads % n == 0 {
                debug!(read = self.reads, "Synthetic sensor dropping frame");
                return Ok(None);
            }
        }
        Ok(Some(RawFrame::new(self.render())))
    }

    fn release(&mut self) {
        self.released = true;
    }
}
