//! Video4Linux capture backend for USB sensors.
//!
//! The sensor advertises its packed raw stream as a 16-bit-per-pixel YUYV format; the bytes
//! are not YUV and are handed to the decoder untouched. Format negotiation is deferred until
//! the capture mode is written so width and height can arrive first, and streaming starts on
//! the first read.

use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::control::{Control, Value};
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::roi_pipeline::camera::device::{CameraBackend, CameraDevice};
use crate::roi_pipeline::camera::types::{
    DeviceProperty, FRAME_HEIGHT, FRAME_WIDTH, RAW_CAPTURE_MODE, RawFrame,
};
use crate::roi_pipeline::common::error::{MonitorError, Result};

const V4L2_CID_BRIGHTNESS: u32 = 0x0098_0900;
const V4L2_CID_GAIN: u32 = 0x0098_0913;
const STREAM_BUFFERS: u32 = 4;
const RAW_FOURCC: &[u8; 4] = b"YUYV";

pub struct V4lBackend;

impl CameraBackend for V4lBackend {
    type Device = V4lDevice;

    fn open(&self, index: u32) -> Result<V4lDevice> {
        let device = Device::new(index as usize).map_err(|e| {
            MonitorError::DeviceUnavailable(format!("/dev/video{index}: {e}"))
        })?;
        info!(index, "Opened V4L2 device");
        Ok(V4lDevice {
            device: Some(device),
            stream: None,
            width: FRAME_WIDTH as u32,
            height: FRAME_HEIGHT as u32,
        })
    }
}

pub struct V4lDevice {
    device: Option<Device>,
    stream: Option<Stream<'static>>,
    width: u32,
    height: u32,
}

impl V4lDevice {
    fn device(&self) -> Result<&Device> {
        self.device
            .as_ref()
            .ok_or_else(|| MonitorError::DeviceUnavailable("device released".to_string()))
    }

    fn negotiate_format(&mut self) -> Result<()> {
        let requested = Format::new(self.width, self.height, FourCC::new(RAW_FOURCC));
        let applied = self
            .device()?
            .set_format(&requested)
            .map_err(|e| MonitorError::DeviceWrite(format!("set_format: {e}")))?;

        if applied.width != self.width || applied.height != self.height {
            return Err(MonitorError::DeviceWrite(format!(
                "device negotiated {}x{} instead of {}x{}",
                applied.width, applied.height, self.width, self.height
            )));
        }
        info!(format = %applied, "V4L2 format set");
        Ok(())
    }

    fn set_control(&self, id: u32, value: f64) -> Result<()> {
        self.device()?
            .set_control(Control {
                id,
                value: Value::Integer(value as i64),
            })
            .map_err(|e| MonitorError::DeviceWrite(e.to_string()))
    }
}

impl CameraDevice for V4lDevice {
    fn set_property(&mut self, property: DeviceProperty, value: f64) -> Result<()> {
        match property {
            DeviceProperty::FrameWidth => self.width = value as u32,
            DeviceProperty::FrameHeight => self.height = value as u32,
            DeviceProperty::Mode => {
                if value as u32 != RAW_CAPTURE_MODE {
                    return Err(MonitorError::DeviceWrite(format!("unsupported mode {value}")));
                }
                self.negotiate_format()?;
            }
            DeviceProperty::ConvertRgb => {
                // V4L2 never converts; only the raw setting is meaningful.
                if value != 0.0 {
                    return Err(MonitorError::DeviceWrite("RGB conversion unsupported".to_string()));
                }
            }
            DeviceProperty::Brightness => self.set_control(V4L2_CID_BRIGHTNESS, value)?,
            DeviceProperty::Gain => self.set_control(V4L2_CID_GAIN, value)?,
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.stream.is_none() {
            let stream = Stream::with_buffers(self.device()?, Type::VideoCapture, STREAM_BUFFERS)
                .map_err(|e| MonitorError::DeviceUnavailable(format!("stream start: {e}")))?;
            debug!(buffers = STREAM_BUFFERS, "V4L2 stream started");
            self.stream = Some(stream);
        }

        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.next() {
            Ok((buffer, meta)) => {
                let used = (meta.bytesused as usize).min(buffer.len());
                if used == 0 {
                    return Ok(None);
                }
                Ok(Some(RawFrame::new(buffer[..used].to_vec())))
            }
            Err(e) => {
                warn!(error = %e, "V4L2 dequeue failed");
                Ok(None)
            }
        }
    }

    fn release(&mut self) {
        // Stream first: dropping it stops streaming and unmaps buffers.
        self.stream.take();
        self.device.take();
        info!("V4L2 device released");
    }
}
