//! Identity resolution — linear scan of the reference store through the
//! similarity oracle, first positive verdict wins.

use crate::capture::{Frame, FrameError};
use crate::oracle::SimilarityOracle;
use crate::store::ReferenceStore;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("failed to stage candidate frame: {0}")]
    Stage(#[from] FrameError),
    #[error("failed to create temporary file: {0}")]
    TempFile(#[from] std::io::Error),
}

/// Resolve `frame` to a registered identity, or `None` if nothing matches.
///
/// The scan walks identities in the store's (sorted) enumeration order and
/// stops at the first reference the oracle verifies; the oracle returns
/// only a boolean, so enumeration order is the tie-break. A failed
/// comparison is logged and skipped, never fatal to the scan. An empty
/// store short-circuits without touching the oracle.
///
/// The frame is handed to the oracle through a temporary JPEG that is
/// removed on every exit path (deleted when the handle drops).
pub fn identify(
    frame: &Frame,
    store: &ReferenceStore,
    oracle: &mut dyn SimilarityOracle,
) -> Result<Option<String>, VerifierError> {
    let names = store.identities();
    if names.is_empty() {
        tracing::debug!("reference store empty; skipping verification");
        return Ok(None);
    }

    let staged = tempfile::Builder::new()
        .prefix("tally-candidate-")
        .suffix(".jpg")
        .tempfile()?;
    frame.save_jpeg(staged.path())?;

    for name in &names {
        let reference = store.reference_path(name);
        match oracle.compare(staged.path(), &reference) {
            Ok(true) => {
                tracing::info!(name = %name, "identity verified");
                return Ok(Some(name.clone()));
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(name = %name, error = %err, "comparison failed; skipping reference");
            }
        }
    }

    tracing::info!(references = names.len(), "no identity matched");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use std::path::Path;

    /// Scripted oracle: one verdict per reference, consumed in call order.
    struct ScriptedOracle {
        verdicts: Vec<Result<bool, OracleError>>,
        calls: usize,
    }

    impl ScriptedOracle {
        fn new(verdicts: Vec<Result<bool, OracleError>>) -> Self {
            Self { verdicts, calls: 0 }
        }
    }

    impl SimilarityOracle for ScriptedOracle {
        fn compare(&mut self, _candidate: &Path, _reference: &Path) -> Result<bool, OracleError> {
            self.calls += 1;
            self.verdicts.remove(0)
        }
    }

    /// Oracle that verifies only byte-identical images.
    struct ExactOracle;

    impl SimilarityOracle for ExactOracle {
        fn compare(&mut self, candidate: &Path, reference: &Path) -> Result<bool, OracleError> {
            let a = std::fs::read(candidate)
                .map_err(|e| OracleError::Comparison(e.to_string()))?;
            let b = std::fs::read(reference)
                .map_err(|e| OracleError::Comparison(e.to_string()))?;
            Ok(a == b)
        }
    }

    fn frame(seed: u8) -> Frame {
        Frame::new(vec![seed; 8 * 8], 8, 8)
    }

    fn store_with(names: &[&str]) -> (tempfile::TempDir, ReferenceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path()).unwrap();
        for name in names {
            store.register(name, &frame(200)).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_empty_store_no_oracle_calls() {
        let (_dir, store) = store_with(&[]);
        let mut oracle = ScriptedOracle::new(vec![]);
        let result = identify(&frame(1), &store, &mut oracle).unwrap();
        assert_eq!(result, None);
        assert_eq!(oracle.calls, 0);
    }

    #[test]
    fn test_first_match_wins_in_enumeration_order() {
        // Names sort alice < bob; both would verify true.
        let (_dir, store) = store_with(&["bob", "alice"]);
        let mut oracle = ScriptedOracle::new(vec![Ok(true), Ok(true)]);
        let result = identify(&frame(1), &store, &mut oracle).unwrap();
        assert_eq!(result.as_deref(), Some("alice"));
        assert_eq!(oracle.calls, 1, "scan must stop at the first match");
    }

    #[test]
    fn test_failure_skipped_not_fatal() {
        let (_dir, store) = store_with(&["alice", "bob"]);
        let mut oracle = ScriptedOracle::new(vec![
            Err(OracleError::NoFace("no face in reference".into())),
            Ok(true),
        ]);
        let result = identify(&frame(1), &store, &mut oracle).unwrap();
        assert_eq!(result.as_deref(), Some("bob"));
        assert_eq!(oracle.calls, 2);
    }

    #[test]
    fn test_no_match_after_exhausting_store() {
        let (_dir, store) = store_with(&["alice", "bob"]);
        let mut oracle = ScriptedOracle::new(vec![Ok(false), Ok(false)]);
        let result = identify(&frame(1), &store, &mut oracle).unwrap();
        assert_eq!(result, None);
        assert_eq!(oracle.calls, 2);
    }

    #[test]
    fn test_all_failures_yield_no_match() {
        let (_dir, store) = store_with(&["alice", "bob"]);
        let mut oracle = ScriptedOracle::new(vec![
            Err(OracleError::Comparison("model error".into())),
            Err(OracleError::Comparison("model error".into())),
        ]);
        let result = identify(&frame(1), &store, &mut oracle).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_registered_frame_identifies_itself() {
        // Register Alice with frame X; identifying X through an oracle that
        // verifies byte-identical images must resolve to Alice.
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path()).unwrap();
        let x = frame(42);
        store.register("Alice", &x).unwrap();

        let result = identify(&x, &store, &mut ExactOracle).unwrap();
        assert_eq!(result.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_candidate_artifact_removed() {
        // The staged candidate must not outlive the call, even on the
        // no-match path. Capture its path through the oracle.
        struct PathRecorder {
            seen: Option<std::path::PathBuf>,
        }

        impl SimilarityOracle for PathRecorder {
            fn compare(&mut self, candidate: &Path, _reference: &Path) -> Result<bool, OracleError> {
                self.seen = Some(candidate.to_path_buf());
                Ok(false)
            }
        }

        let (_dir, store) = store_with(&["alice"]);
        let mut oracle = PathRecorder { seen: None };
        identify(&frame(1), &store, &mut oracle).unwrap();

        let staged = oracle.seen.expect("oracle was never consulted");
        assert!(!staged.exists(), "staged candidate must be deleted");
    }
}
