//! Raw buffer conversion and frame quality checks.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
}

/// Convert packed YUYV (4:2:2) to grayscale by extracting the Y channel.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V].
/// Grayscale = every even-indexed byte.
pub fn yuyv_to_grayscale(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(ConvertError::BufferTooShort {
            expected,
            actual: yuyv.len(),
        });
    }
    Ok(yuyv[..expected].iter().step_by(2).copied().collect())
}

/// Convert 16-bit little-endian grayscale to 8-bit by keeping the high byte.
pub fn y16_to_grayscale(buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let pixels = (width * height) as usize;
    let expected = pixels * 2;
    if buf.len() < expected {
        return Err(ConvertError::BufferTooShort {
            expected,
            actual: buf.len(),
        });
    }
    let mut gray = Vec::with_capacity(pixels);
    for idx in 0..pixels {
        let low = buf[idx * 2] as u16;
        let high = buf[idx * 2 + 1] as u16;
        gray.push(((high << 8 | low) >> 8) as u8);
    }
    Ok(gray)
}

/// Take the first `width * height` bytes of a native 8-bit grayscale buffer.
pub fn grey_to_grayscale(buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let pixels = (width * height) as usize;
    if buf.len() < pixels {
        return Err(ConvertError::BufferTooShort {
            expected: pixels,
            actual: buf.len(),
        });
    }
    Ok(buf[..pixels].to_vec())
}

/// Check if a frame is dark: more than `threshold_pct` of pixels below 32.
///
/// Webcams need a few frames for auto-exposure to settle; near-black
/// frames are not worth handing to the verifier.
pub fn is_dark_frame(gray: &[u8], threshold_pct: f32) -> bool {
    if gray.is_empty() {
        return true;
    }
    let dark_count = gray.iter().filter(|&&p| p < 32).count();
    (dark_count as f32 / gray.len() as f32) > threshold_pct
}
