//! Protocolists — the staff members cases are assigned to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ProtocolistId = i64;

/// A protocolist as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocolist {
  pub id:            ProtocolistId,
  pub created_at:    DateTime<Utc>,
  pub complete_name: String,
  pub last_name:     String,
  pub email:         String,
  pub observations:  Option<String>,
  /// Number of `in_progress` cases referencing this protocolist, computed at
  /// read time.
  pub ongoing_cases: u32,
}

impl Protocolist {
  /// Display name used in conflict messages and notifications.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.complete_name, self.last_name)
  }
}

/// Input to create or fully replace a protocolist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProtocolist {
  pub complete_name: String,
  pub last_name:     String,
  pub email:         String,
  #[serde(default)]
  pub observations:  Option<String>,
}
