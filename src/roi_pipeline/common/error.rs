use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Camera device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Camera returned no frame data")]
    FrameUnavailable,

    #[error("Malformed raw frame: expected {expected} samples, got {actual}")]
    FormatError { expected: usize, actual: usize },

    #[error("ROI out of range: rows [{start}, {end}) do not fit a {height}-row frame")]
    RoiOutOfRange { start: i64, end: i64, height: usize },

    #[error("Invalid {name} value {value}: expected {min}..={max}")]
    InvalidParameter {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Device parameter write failed: {0}")]
    DeviceWrite(String),

    #[error("Update loop is no longer running")]
    LoopStopped,

    #[error("Failed to export data: {0}")]
    ExportError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MonitorError {
    /// Faults that only affect the current cycle; the update loop keeps running after them.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MonitorError::DeviceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
