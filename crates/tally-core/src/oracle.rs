//! Similarity oracle seam — the face-verification collaborator contract.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("no usable face in image: {0}")]
    NoFace(String),
    #[error("comparison failed: {0}")]
    Comparison(String),
}

/// Black-box "same person" verdict over two face images on disk.
///
/// A per-comparison failure is expected behavior (no face found, model
/// error); callers scanning a gallery must skip the failing reference and
/// continue rather than abort.
pub trait SimilarityOracle {
    fn compare(&mut self, candidate: &Path, reference: &Path) -> Result<bool, OracleError>;
}
