//! tally-core — Attendance ledger and face-verification workflow.
//!
//! The two external collaborators (camera and face-similarity oracle) are
//! trait seams; concrete implementations live in `tally-hw` and
//! `tally-oracle`.

pub mod capture;
pub mod ledger;
pub mod oracle;
pub mod record;
pub mod session;
pub mod store;
pub mod verifier;

pub use capture::{CameraError, Frame, FrameSource};
pub use ledger::{Ledger, LedgerError, LedgerSummary};
pub use oracle::{OracleError, SimilarityOracle};
pub use record::{AttendanceRecord, CheckKind, TIME_FORMAT};
pub use session::{Session, SessionError, SessionState, Sessions, VerifyOutcome};
pub use store::{ReferenceStore, StoreError};
