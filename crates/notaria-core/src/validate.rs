//! The validation gate: rejections and the storage-free checks.
//!
//! Screening runs cheap checks in a fixed order (escritura format, then
//! dates) so the caller always sees the first failing rule. Uniqueness checks
//! need the store and live in [`crate::lifecycle`].

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::{
  case::{CaseDraft, Conflict, NewCase},
  invoice::NewInvoice,
  protocolist::NewProtocolist,
};

static ESCRITURA: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[0-9]{1,5}$").expect("static regex"));

/// Wire format for every calendar date in the system.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Rejection ───────────────────────────────────────────────────────────────

/// Why a payload may not be persisted. Terminal for the request; the message
/// is meant to be shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
  #[error(
    "escritura must be 1 to 5 digits with no letters or symbols (got {escritura:?})"
  )]
  InvalidFormat { escritura: String },

  #[error("{field} is not valid: {detail}")]
  InvalidDate { field: &'static str, detail: String },

  #[error("radicado {radicado} already exists in {conflict}")]
  DuplicateRadicado { radicado: String, conflict: Conflict },

  #[error(
    "escritura {escritura} dated {document_date} already exists in {conflict}"
  )]
  DuplicateEscritura {
    escritura:     String,
    document_date: NaiveDate,
    conflict:      Conflict,
  },

  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("{field} {reason}")]
  InvalidField { field: &'static str, reason: &'static str },

  #[error("email {0} is already registered to another protocolist")]
  DuplicateEmail(String),
}

/// Outcome of a write the store may refuse on business grounds. The outer
/// `Result` of a store call carries infrastructure failures; this one carries
/// rejections.
pub type Checked<T> = std::result::Result<T, Rejection>;

// ─── Cases ───────────────────────────────────────────────────────────────────

/// Run the storage-free half of the gate: escritura format, then dates.
///
/// `today` is the caller's notion of the current date (UTC in production).
pub fn screen_case(input: &NewCase, today: NaiveDate) -> Checked<CaseDraft> {
  check_escritura(&input.escritura)?;

  let creation_date = match input.creation_date.as_deref() {
    Some(raw) => parse_date("creation_date", raw)?,
    None => today,
  };
  let document_date = parse_date("document_date", &input.document_date)?;
  not_after_today("creation_date", creation_date, today)?;
  not_after_today("document_date", document_date, today)?;

  Ok(CaseDraft {
    creation_date,
    document_date,
    escritura: input.escritura.clone(),
    radicado: input.radicado.clone(),
    protocolist_id: input.protocolist_id,
    observaciones: input.observaciones.clone(),
  })
}

pub fn check_escritura(escritura: &str) -> Checked<()> {
  if ESCRITURA.is_match(escritura) {
    Ok(())
  } else {
    Err(Rejection::InvalidFormat { escritura: escritura.to_owned() })
  }
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(field: &'static str, raw: &str) -> Checked<NaiveDate> {
  let malformed = || Rejection::InvalidDate {
    field,
    detail: format!("{raw:?} is not a YYYY-MM-DD date"),
  };
  // chrono accepts unpadded components; the wire format is fixed-width.
  if raw.len() != 10 {
    return Err(malformed());
  }
  NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| malformed())
}

fn not_after_today(
  field: &'static str,
  date: NaiveDate,
  today: NaiveDate,
) -> Checked<()> {
  if date > today {
    return Err(Rejection::InvalidDate {
      field,
      detail: format!("{date} is later than today ({today})"),
    });
  }
  Ok(())
}

// ─── Protocolists ────────────────────────────────────────────────────────────

pub fn check_protocolist(input: &NewProtocolist) -> Checked<()> {
  if input.complete_name.trim().is_empty() {
    return Err(Rejection::MissingField("complete_name"));
  }
  if input.last_name.trim().is_empty() {
    return Err(Rejection::MissingField("last_name"));
  }
  if input.email.trim().is_empty() {
    return Err(Rejection::MissingField("email"));
  }
  if !input.email.contains('@') {
    return Err(Rejection::InvalidField {
      field:  "email",
      reason: "must be an email address",
    });
  }
  Ok(())
}

// ─── Invoices ────────────────────────────────────────────────────────────────

pub fn check_invoice(input: &NewInvoice) -> Checked<()> {
  if input.escritura <= 0 {
    return Err(Rejection::InvalidField {
      field:  "escritura",
      reason: "must be a positive integer",
    });
  }
  if input.number <= 0 {
    return Err(Rejection::InvalidField {
      field:  "number",
      reason: "must be a positive integer",
    });
  }
  non_negative("rentas", input.rentas)?;
  non_negative("registro", input.registro)?;
  if input.protocolist.trim().is_empty() {
    return Err(Rejection::MissingField("protocolist"));
  }
  non_negative("total", input.total)?;
  Ok(())
}

fn non_negative(field: &'static str, amount: f64) -> Checked<()> {
  if amount.is_finite() && amount >= 0.0 {
    Ok(())
  } else {
    Err(Rejection::InvalidField { field, reason: "must be a non-negative number" })
  }
}
