//! tally-hw — Webcam access for attendance capture.
//!
//! Implements the core's `FrameSource` seam on top of V4L2, with
//! exclusive, short-lived device access: open, read one frame, release.

pub mod camera;
pub mod convert;

pub use camera::{Webcam, DEFAULT_DEVICE};
