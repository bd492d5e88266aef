//! Case records — the filings tracked from intake to finalisation.
//!
//! A case enters the system as a [`NewCase`] (the raw candidate payload, dates
//! still in their `YYYY-MM-DD` wire form), is screened into a [`CaseDraft`] by
//! the validation gate, and is stored as a [`CaseRecord`].

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::protocolist::ProtocolistId;

/// Integer row id assigned by the store.
pub type CaseId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a case stands. The only transition is `InProgress → Finished`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
  #[default]
  InProgress,
  Finished,
}

// ─── Stored record ───────────────────────────────────────────────────────────

/// A case as persisted in the `case_rents` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
  pub id:             CaseId,
  /// Set once at creation; never edited afterwards.
  pub creation_date:  NaiveDate,
  /// Date printed on the deed.
  pub document_date:  NaiveDate,
  pub escritura:      String,
  pub radicado:       String,
  /// Weak reference: the protocolist may have been deleted since.
  pub protocolist_id: ProtocolistId,
  pub observaciones:  Option<String>,
  pub status:         CaseStatus,
  /// Server-assigned; refreshed on every mutation.
  pub last_modified:  DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Candidate payload for a new case, exactly as a caller submits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCase {
  /// Defaults to today when absent.
  #[serde(default)]
  pub creation_date:  Option<String>,
  pub document_date:  String,
  pub escritura:      String,
  pub radicado:       String,
  pub protocolist_id: ProtocolistId,
  #[serde(default)]
  pub observaciones:  Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasePatch {
  #[serde(default)]
  pub document_date:  Option<String>,
  #[serde(default)]
  pub escritura:      Option<String>,
  #[serde(default)]
  pub radicado:       Option<String>,
  #[serde(default)]
  pub protocolist_id: Option<ProtocolistId>,
  /// `None` keeps the stored notes; `Some(None)` (an explicit `null`) clears
  /// them.
  #[serde(default, deserialize_with = "present")]
  pub observaciones:  Option<Option<String>>,
}

/// Wraps any value that is present, `null` included, in `Some`. Absent fields
/// fall back to `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(deserializer).map(Some)
}

impl CasePatch {
  /// Overlay this patch on `current`, yielding the full candidate payload to
  /// re-validate. `creation_date` always comes from the stored record.
  pub fn merge_onto(self, current: &CaseRecord) -> NewCase {
    NewCase {
      creation_date:  Some(current.creation_date.to_string()),
      document_date:  self
        .document_date
        .unwrap_or_else(|| current.document_date.to_string()),
      escritura:      self.escritura.unwrap_or_else(|| current.escritura.clone()),
      radicado:       self.radicado.unwrap_or_else(|| current.radicado.clone()),
      protocolist_id: self.protocolist_id.unwrap_or(current.protocolist_id),
      observaciones:  self
        .observaciones
        .unwrap_or_else(|| current.observaciones.clone()),
    }
  }
}

/// A screened payload: format and dates already checked, dates parsed.
/// This is what the store writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDraft {
  pub creation_date:  NaiveDate,
  pub document_date:  NaiveDate,
  pub escritura:      String,
  pub radicado:       String,
  pub protocolist_id: ProtocolistId,
  pub observaciones:  Option<String>,
}

// ─── Conflicts ───────────────────────────────────────────────────────────────

/// The existing record a candidate collides with, joined with the name of its
/// protocolist for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
  pub case_id:     CaseId,
  /// `None` when the referenced protocolist no longer exists.
  pub protocolist: Option<String>,
}

impl fmt::Display for Conflict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.protocolist {
      Some(name) => write!(f, "case {}, assigned to {name}", self.case_id),
      None => write!(f, "case {}, which has no assigned protocolist", self.case_id),
    }
  }
}
