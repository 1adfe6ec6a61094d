//! Per-interaction verification session.
//!
//! One session per check kind, driven by the four operator actions:
//! capture, verify, recapture, reset. The session owns the captured frame
//! and its timestamp; nothing about it is global state.

use crate::capture::{CameraError, Frame, FrameSource};
use crate::ledger::{Ledger, LedgerError};
use crate::oracle::SimilarityOracle;
use crate::record::{AttendanceRecord, CheckKind};
use crate::store::ReferenceStore;
use crate::verifier::{self, VerifierError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Verifier(#[from] VerifierError),
    #[error("no frame captured yet")]
    NoFrame,
    #[error("attendance already logged; reset the session to start over")]
    AlreadyLogged,
}

/// Where the session is in its lifecycle.
///
/// `Idle --capture--> FrameCaptured --verify--> Logged --reset--> Idle`.
/// A failed or no-match verify leaves the session in `FrameCaptured` so
/// the operator can retry without recapturing.
#[derive(Debug)]
pub enum SessionState {
    Idle,
    FrameCaptured { frame: Frame },
    Logged { record: AttendanceRecord },
}

/// Outcome of a verify action that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Identity resolved and the record is on disk.
    Logged(AttendanceRecord),
    /// Normal terminal outcome, not an error; the frame is kept for retry.
    NoMatch,
}

pub struct Session {
    kind: CheckKind,
    state: SessionState,
}

impl Session {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            state: SessionState::Idle,
        }
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn captured_frame(&self) -> Option<&Frame> {
        match &self.state {
            SessionState::FrameCaptured { frame } => Some(frame),
            _ => None,
        }
    }

    pub fn is_logged(&self) -> bool {
        matches!(self.state, SessionState::Logged { .. })
    }

    /// Acquire a frame and enter `FrameCaptured`.
    ///
    /// Legal from `Idle` (initial capture) and from `FrameCaptured`, where
    /// it replaces the held frame. On acquisition failure the state is
    /// unchanged and the error is surfaced.
    pub fn capture(&mut self, camera: &mut dyn FrameSource) -> Result<&Frame, SessionError> {
        if self.is_logged() {
            return Err(SessionError::AlreadyLogged);
        }
        let frame = camera.capture()?;
        tracing::debug!(kind = %self.kind, at = %frame.captured_at, "frame captured");
        self.state = SessionState::FrameCaptured { frame };
        match &self.state {
            SessionState::FrameCaptured { frame } => Ok(frame),
            _ => unreachable!(),
        }
    }

    /// Discard the held frame and acquire a new one.
    ///
    /// Legal only from `FrameCaptured`. The old frame is kept if the new
    /// acquisition fails.
    pub fn recapture(&mut self, camera: &mut dyn FrameSource) -> Result<&Frame, SessionError> {
        match self.state {
            SessionState::FrameCaptured { .. } => self.capture(camera),
            SessionState::Idle => Err(SessionError::NoFrame),
            SessionState::Logged { .. } => Err(SessionError::AlreadyLogged),
        }
    }

    /// Run verification on the held frame and, on a match, append to the
    /// ledger and enter `Logged`.
    ///
    /// A no-match keeps the frame for retry. A ledger write failure also
    /// keeps the session in `FrameCaptured`: the record is not considered
    /// logged until it is on disk.
    pub fn verify(
        &mut self,
        store: &ReferenceStore,
        oracle: &mut dyn SimilarityOracle,
        ledger: &Ledger,
    ) -> Result<VerifyOutcome, SessionError> {
        let frame = match &self.state {
            SessionState::FrameCaptured { frame } => frame,
            SessionState::Idle => return Err(SessionError::NoFrame),
            SessionState::Logged { .. } => return Err(SessionError::AlreadyLogged),
        };

        let Some(name) = verifier::identify(frame, store, oracle)? else {
            tracing::info!(kind = %self.kind, "verification found no match");
            return Ok(VerifyOutcome::NoMatch);
        };

        let record = AttendanceRecord::now(name, self.kind);
        ledger.append(record.clone())?;
        tracing::info!(kind = %self.kind, name = %record.name, time = %record.time, "attendance logged");
        self.state = SessionState::Logged {
            record: record.clone(),
        };
        Ok(VerifyOutcome::Logged(record))
    }

    /// Return to `Idle`, dropping any frame or logged record.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }
}

/// One independent session per check kind, plus a global clear.
pub struct Sessions {
    check_in: Session,
    check_out: Session,
}

impl Sessions {
    pub fn new() -> Self {
        Self {
            check_in: Session::new(CheckKind::CheckIn),
            check_out: Session::new(CheckKind::CheckOut),
        }
    }

    pub fn get(&self, kind: CheckKind) -> &Session {
        match kind {
            CheckKind::CheckIn => &self.check_in,
            CheckKind::CheckOut => &self.check_out,
        }
    }

    pub fn get_mut(&mut self, kind: CheckKind) -> &mut Session {
        match kind {
            CheckKind::CheckIn => &mut self.check_in,
            CheckKind::CheckOut => &mut self.check_out,
        }
    }

    /// Drop all in-memory session state. Persisted data is untouched.
    pub fn clear(&mut self) {
        self.check_in.reset();
        self.check_out.reset();
        tracing::info!("all sessions cleared");
    }
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new()
    }
}
