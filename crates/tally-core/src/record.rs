use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used in every persisted attendance record.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Direction of an attendance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckKind {
    #[serde(rename = "Check-In")]
    CheckIn,
    #[serde(rename = "Check-Out")]
    CheckOut,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::CheckIn => f.write_str("Check-In"),
            CheckKind::CheckOut => f.write_str("Check-Out"),
        }
    }
}

/// One immutable ledger entry. Field names match the on-disk JSON schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: CheckKind,
    #[serde(rename = "Time")]
    pub time: String,
}

impl AttendanceRecord {
    /// Build a record with the timestamp rendered in [`TIME_FORMAT`].
    pub fn new(name: impl Into<String>, kind: CheckKind, at: DateTime<Local>) -> Self {
        Self {
            name: name.into(),
            kind,
            time: at.format(TIME_FORMAT).to_string(),
        }
    }

    /// Build a record stamped with the current local time.
    pub fn now(name: impl Into<String>, kind: CheckKind) -> Self {
        Self::new(name, kind, Local::now())
    }
}
