//! Frame type and the camera collaborator seam.

use chrono::{DateTime, Local};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("frame read failed: {0}")]
    ReadFailed(String),
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame buffer length {actual} does not match {width}x{height}")]
    BufferMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// A captured grayscale camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            captured_at: Local::now(),
        }
    }

    /// Average pixel brightness (0.0–255.0).
    pub fn avg_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&b| b as f32).sum::<f32>() / self.data.len() as f32
    }

    /// Encode the frame as JPEG at `path`.
    pub fn save_jpeg(&self, path: &Path) -> Result<(), FrameError> {
        let img = image::GrayImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            FrameError::BufferMismatch {
                width: self.width,
                height: self.height,
                actual: self.data.len(),
            },
        )?;
        img.save_with_format(path, image::ImageFormat::Jpeg)?;
        Ok(())
    }
}

/// One-shot frame acquisition.
///
/// Implementations must hold the device exclusively and briefly: open,
/// read a single frame, release before returning. Nothing in the core
/// keeps a device handle across interactions.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame, CameraError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_brightness() {
        let frame = Frame::new(vec![0, 100, 200], 3, 1);
        assert!((frame.avg_brightness() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_avg_brightness_empty() {
        let frame = Frame::new(Vec::new(), 0, 0);
        assert_eq!(frame.avg_brightness(), 0.0);
    }

    #[test]
    fn test_save_jpeg_rejects_short_buffer() {
        let frame = Frame::new(vec![0u8; 3], 4, 4);
        let dir = tempfile::tempdir().unwrap();
        let result = frame.save_jpeg(&dir.path().join("frame.jpg"));
        assert!(matches!(result, Err(FrameError::BufferMismatch { .. })));
    }

    #[test]
    fn test_save_jpeg_writes_file() {
        let frame = Frame::new(vec![128u8; 16 * 16], 16, 16);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        frame.save_jpeg(&path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
