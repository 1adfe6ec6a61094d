//! One-shot V4L2 webcam capture via the `v4l` crate.

use crate::convert;
use std::path::Path;
use tally_core::{CameraError, Frame, FrameSource};
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Raw reads attempted per capture before giving up on a non-dark frame.
const MAX_READS: usize = 4;

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel, extract Y channel).
    Yuyv,
    /// 8-bit grayscale (1 byte/pixel).
    Grey,
    /// 16-bit little-endian grayscale (2 bytes/pixel, common IR camera format).
    Y16,
}

impl PixelFormat {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        if fourcc == FourCC::new(b"YUYV") {
            Some(PixelFormat::Yuyv)
        } else if fourcc == FourCC::new(b"GREY") {
            Some(PixelFormat::Grey)
        } else if fourcc == FourCC::new(b"Y16 ") || fourcc == FourCC::new(b"Y16\0") {
            Some(PixelFormat::Y16)
        } else {
            None
        }
    }
}

/// Webcam frame source.
///
/// The device is opened, read, and released inside every `capture` call;
/// no handle survives between interactions, so other programs can use the
/// camera in between.
pub struct Webcam {
    device_path: String,
}

impl Webcam {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }

    fn open(&self) -> Result<(Device, u32, u32, PixelFormat), CameraError> {
        let path = &self.device_path;
        if !Path::new(path).exists() {
            return Err(CameraError::Unavailable(format!("device not found: {path}")));
        }

        let device = Device::with_path(path)
            .map_err(|e| CameraError::Unavailable(format!("{path}: {e}")))?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::Unavailable(format!("failed to query capabilities: {e}")))?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::Unavailable(format!(
                "{path} does not support video capture"
            )));
        }

        // Ask for YUYV 640x480; accept whatever the driver negotiates as
        // long as we can convert it to grayscale.
        let mut fmt = device
            .format()
            .map_err(|e| CameraError::Unavailable(format!("failed to get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = 640;
        fmt.height = 480;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| CameraError::Unavailable(format!("failed to set format: {e}")))?;

        let pixel_format = PixelFormat::from_fourcc(negotiated.fourcc).ok_or_else(|| {
            CameraError::Unavailable(format!(
                "unsupported pixel format: {:?} (need YUYV, GREY, or Y16)",
                negotiated.fourcc
            ))
        })?;

        tracing::debug!(
            device = %path,
            driver = %caps.driver,
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?negotiated.fourcc,
            "camera opened"
        );

        Ok((device, negotiated.width, negotiated.height, pixel_format))
    }
}

impl FrameSource for Webcam {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        let (device, width, height, pixel_format) = self.open()?;

        let mut stream = MmapStream::with_buffers(&device, BufType::VideoCapture, 4)
            .map_err(|e| CameraError::ReadFailed(format!("failed to create mmap stream: {e}")))?;

        let mut dark_skipped = 0usize;
        for _ in 0..MAX_READS {
            let (buf, meta) = stream
                .next()
                .map_err(|e| CameraError::ReadFailed(format!("failed to dequeue buffer: {e}")))?;

            let gray = match pixel_format {
                PixelFormat::Yuyv => convert::yuyv_to_grayscale(buf, width, height),
                PixelFormat::Grey => convert::grey_to_grayscale(buf, width, height),
                PixelFormat::Y16 => convert::y16_to_grayscale(buf, width, height),
            }
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;

            if convert::is_dark_frame(&gray, 0.95) {
                dark_skipped += 1;
                tracing::debug!(seq = meta.sequence, "skipping dark frame");
                continue;
            }

            return Ok(Frame::new(gray, width, height));
            // stream and device drop on return, releasing the camera
        }

        Err(CameraError::ReadFailed(format!(
            "no usable frame after {MAX_READS} reads ({dark_skipped} dark)"
        )))
    }
}
