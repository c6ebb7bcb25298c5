//! Camera configuration and frame types

use std::time::Instant;

/// Sensor width in pixels
pub const FRAME_WIDTH: usize = 1280;
/// Sensor height in pixels
pub const FRAME_HEIGHT: usize = 800;
/// Vendor-specific capture mode that delivers the packed raw stream
pub const RAW_CAPTURE_MODE: u32 = 2;

/// Device properties the session configures.
///
/// Mirrors the property model exposed by UVC capture stacks: each property is written as a
/// single numeric value and the device may silently ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProperty {
    FrameWidth,
    FrameHeight,
    /// Vendor capture mode; mode 2 selects packed raw output
    Mode,
    /// 0 disables the driver's RGB conversion so raw bytes arrive untouched
    ConvertRgb,
    Brightness,
    Gain,
}

impl DeviceProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceProperty::FrameWidth => "frame_width",
            DeviceProperty::FrameHeight => "frame_height",
            DeviceProperty::Mode => "mode",
            DeviceProperty::ConvertRgb => "convert_rgb",
            DeviceProperty::Brightness => "brightness",
            DeviceProperty::Gain => "gain",
        }
    }
}

/// One packed frame as delivered by the device.
///
/// The capture API hands back a 2-D buffer whose first row carries the whole packed frame;
/// `data` is that row.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub captured_at: Instant,
}

impl RawFrame {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            captured_at: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Configuration applied to the device when a session opens
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Logical device index (0 is the first USB camera)
    pub device_index: u32,
    /// Frame width in pixels
    pub width: usize,
    /// Frame height in pixels
    pub height: usize,
    /// Vendor capture mode flag
    pub capture_mode: u32,
    /// Whether the driver converts frames to RGB (must stay off for raw decoding)
    pub convert_rgb: bool,
    /// Brightness written at open time
    pub initial_brightness: u32,
    /// Gain written at open time
    pub initial_gain: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            capture_mode: RAW_CAPTURE_MODE,
            convert_rgb: false,
            initial_brightness: 300,
            initial_gain: 8,
        }
    }
}

impl SensorConfig {
    pub fn builder() -> SensorConfigBuilder {
        SensorConfigBuilder::default()
    }

    /// Expected byte length of a well-formed packed frame
    pub fn frame_bytes(&self) -> usize {
        2 * self.width * self.height
    }
}

/// Builder for SensorConfig
#[derive(Default)]
pub struct SensorConfigBuilder {
    device_index: Option<u32>,
    width: Option<usize>,
    height: Option<usize>,
    capture_mode: Option<u32>,
    convert_rgb: Option<bool>,
    initial_brightness: Option<u32>,
    initial_gain: Option<u32>,
}

impl SensorConfigBuilder {
    pub fn device_index(mut self, index: u32) -> Self {
        self.device_index = Some(index);
        self
    }

    pub fn geometry(mut self, width: usize, height: usize) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn capture_mode(mut self, mode: u32) -> Self {
        self.capture_mode = Some(mode);
        self
    }

    pub fn convert_rgb(mut self, enable: bool) -> Self {
        self.convert_rgb = Some(enable);
        self
    }

    pub fn initial_brightness(mut self, brightness: u32) -> Self {
        self.initial_brightness = Some(brightness);
        self
    }

    pub fn initial_gain(mut self, gain: u32) -> Self {
        self.initial_gain = Some(gain);
        self
    }

    pub fn build(self) -> SensorConfig {
        let default = SensorConfig::default();
        SensorConfig {
            device_index: self.device_index.unwrap_or(default.device_index),
            width: self.width.unwrap_or(default.width),
            height: self.height.unwrap_or(default.height),
            capture_mode: self.capture_mode.unwrap_or(default.capture_mode),
            convert_rgb: self.convert_rgb.unwrap_or(default.convert_rgb),
            initial_brightness: self.initial_brightness.unwrap_or(default.initial_brightness),
            initial_gain: self.initial_gain.unwrap_or(default.initial_gain),
        }
    }
}
