//! tally-oracle — "same person" verdicts via ArcFace embeddings.
//!
//! Loads the w600k_r50 ArcFace model through ONNX Runtime, embeds the
//! candidate and reference images, and thresholds their cosine similarity
//! into the boolean the core consumes. No face detection pass: the whole
//! frame is resized to the model input, so the subject should fill the
//! frame (webcam-kiosk framing).

pub mod embedding;

use embedding::Embedding;
use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use tally_core::{OracleError, SimilarityOracle};
use thiserror::Error;

const ARCFACE_INPUT_SIZE: usize = 112;
const ARCFACE_MEAN: f32 = 127.5;
const ARCFACE_STD: f32 = 127.5; // symmetric normalization, not 128.0
const ARCFACE_EMBEDDING_DIM: usize = 512;

/// Cosine similarity at or above this counts as "same person".
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.40;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model file not found: {0} — download w600k_r50.onnx from insightface")]
    ModelNotFound(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// ArcFace-backed similarity oracle.
pub struct ArcFaceOracle {
    session: Session,
    threshold: f32,
}

impl ArcFaceOracle {
    /// Load the ArcFace ONNX model from the given path.
    pub fn load(model_path: &Path, threshold: f32) -> Result<Self, ModelError> {
        if !model_path.exists() {
            return Err(ModelError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        let session = Session::builder()?
            .with_intra_threads(2)
            .map_err(ort::Error::from)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = %model_path.display(),
            threshold,
            "loaded ArcFace model"
        );

        Ok(Self { session, threshold })
    }

    /// Embed one image file: decode, grayscale, resize to 112x112, infer.
    fn embed(&mut self, path: &Path) -> Result<Embedding, OracleError> {
        let img = image::open(path)
            .map_err(|e| OracleError::NoFace(format!("{}: {e}", path.display())))?;
        let size = ARCFACE_INPUT_SIZE as u32;
        let gray = image::imageops::resize(&img.to_luma8(), size, size, FilterType::Triangle);

        let input = preprocess(gray.as_raw());

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())
                .map_err(|e| OracleError::Comparison(format!("tensor build: {e}")))?])
            .map_err(|e| OracleError::Comparison(format!("inference: {e}")))?;

        let (_, raw_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| OracleError::Comparison(format!("embedding extraction: {e}")))?;

        let raw: Vec<f32> = raw_data.to_vec();
        if raw.len() != ARCFACE_EMBEDDING_DIM {
            return Err(OracleError::Comparison(format!(
                "expected {ARCFACE_EMBEDDING_DIM}-dim embedding, got {}",
                raw.len()
            )));
        }

        Ok(Embedding::normalized(raw))
    }
}

impl SimilarityOracle for ArcFaceOracle {
    fn compare(&mut self, candidate: &Path, reference: &Path) -> Result<bool, OracleError> {
        let probe = self.embed(candidate)?;
        let gallery = self.embed(reference)?;
        let similarity = probe.similarity(&gallery);
        tracing::debug!(
            similarity,
            threshold = self.threshold,
            reference = %reference.display(),
            "compared embeddings"
        );
        Ok(similarity >= self.threshold)
    }
}

/// Preprocess a 112x112 grayscale buffer into a NCHW float tensor.
fn preprocess(gray: &[u8]) -> Array4<f32> {
    let size = ARCFACE_INPUT_SIZE;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..size {
        for x in 0..size {
            let pixel = gray.get(y * size + x).copied().unwrap_or(0) as f32;
            let normalized = (pixel - ARCFACE_MEAN) / ARCFACE_STD;
            // Grayscale → 3-channel: replicate Y → [R=Y, G=Y, B=Y]
            tensor[[0, 0, y, x]] = normalized;
            tensor[[0, 1, y, x]] = normalized;
            tensor[[0, 2, y, x]] = normalized;
        }
    }

    tensor
}
