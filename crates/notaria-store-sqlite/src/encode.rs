//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`, timestamps as RFC 3339 strings,
//! enums as their lowercase wire names.

use chrono::{DateTime, NaiveDate, Utc};
use notaria_core::{
  case::{CaseRecord, CaseStatus, Conflict},
  invoice::{Invoice, NewInvoice, PaymentMethod, PaymentState},
  protocolist::Protocolist,
  validate::DATE_FORMAT,
};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── CaseStatus ──────────────────────────────────────────────────────────────

pub fn encode_status(s: CaseStatus) -> &'static str {
  match s {
    CaseStatus::InProgress => "in_progress",
    CaseStatus::Finished => "finished",
  }
}

pub fn decode_status(s: &str) -> Result<CaseStatus> {
  match s {
    "in_progress" => Ok(CaseStatus::InProgress),
    "finished" => Ok(CaseStatus::Finished),
    other => Err(Error::UnknownValue { column: "status", value: other.to_owned() }),
  }
}

// ─── Invoice enums ───────────────────────────────────────────────────────────

pub fn encode_payment_method(m: PaymentMethod) -> &'static str {
  match m {
    PaymentMethod::Pse => "pse",
    PaymentMethod::Efectivo => "efectivo",
  }
}

pub fn decode_payment_method(s: &str) -> Result<PaymentMethod> {
  match s {
    "pse" => Ok(PaymentMethod::Pse),
    "efectivo" => Ok(PaymentMethod::Efectivo),
    other => Err(Error::UnknownValue {
      column: "payment_method",
      value:  other.to_owned(),
    }),
  }
}

pub fn encode_payment_state(s: PaymentState) -> &'static str {
  match s {
    PaymentState::Cancelado => "cancelado",
    PaymentState::SinCancelar => "sin cancelar",
  }
}

pub fn decode_payment_state(s: &str) -> Result<PaymentState> {
  match s {
    "cancelado" => Ok(PaymentState::Cancelado),
    "sin cancelar" => Ok(PaymentState::SinCancelar),
    other => Err(Error::UnknownValue { column: "state", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawCase::from_row`].
pub const CASE_COLUMNS: &str = "id, creation_date, document_date, escritura, radicado,
   protocolist_id, observaciones, status, last_modified";

/// Raw values read directly from a `case_rents` row.
pub struct RawCase {
  pub id:             i64,
  pub creation_date:  String,
  pub document_date:  String,
  pub escritura:      String,
  pub radicado:       String,
  pub protocolist_id: i64,
  pub observaciones:  Option<String>,
  pub status:         String,
  pub last_modified:  String,
}

impl RawCase {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      creation_date:  row.get(1)?,
      document_date:  row.get(2)?,
      escritura:      row.get(3)?,
      radicado:       row.get(4)?,
      protocolist_id: row.get(5)?,
      observaciones:  row.get(6)?,
      status:         row.get(7)?,
      last_modified:  row.get(8)?,
    })
  }

  pub fn into_record(self) -> Result<CaseRecord> {
    Ok(CaseRecord {
      id:             self.id,
      creation_date:  decode_date(&self.creation_date)?,
      document_date:  decode_date(&self.document_date)?,
      escritura:      self.escritura,
      radicado:       self.radicado,
      protocolist_id: self.protocolist_id,
      observaciones:  self.observaciones,
      status:         decode_status(&self.status)?,
      last_modified:  decode_dt(&self.last_modified)?,
    })
  }
}

/// The conflicting case id joined with its protocolist's name columns.
pub struct RawConflict {
  pub case_id:       i64,
  pub complete_name: Option<String>,
  pub last_name:     Option<String>,
}

impl RawConflict {
  pub fn into_conflict(self) -> Conflict {
    let protocolist = match (self.complete_name, self.last_name) {
      (Some(first), Some(last)) => Some(format!("{first} {last}")),
      (Some(only), None) | (None, Some(only)) => Some(only),
      (None, None) => None,
    };
    Conflict { case_id: self.case_id, protocolist }
  }
}

/// Column list matching [`RawProtocolist::from_row`]; expects the
/// `protocolist_rents` table aliased as `p` and a derived case count.
pub const PROTOCOLIST_COLUMNS: &str = "p.id, p.created_at, p.complete_name, p.last_name,
   p.email, p.observations, COUNT(c.id) AS ongoing_cases";

pub struct RawProtocolist {
  pub id:            i64,
  pub created_at:    String,
  pub complete_name: String,
  pub last_name:     String,
  pub email:         String,
  pub observations:  Option<String>,
  pub ongoing_cases: u32,
}

impl RawProtocolist {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      created_at:    row.get(1)?,
      complete_name: row.get(2)?,
      last_name:     row.get(3)?,
      email:         row.get(4)?,
      observations:  row.get(5)?,
      ongoing_cases: row.get(6)?,
    })
  }

  pub fn into_protocolist(self) -> Result<Protocolist> {
    Ok(Protocolist {
      id:            self.id,
      created_at:    decode_dt(&self.created_at)?,
      complete_name: self.complete_name,
      last_name:     self.last_name,
      email:         self.email,
      observations:  self.observations,
      ongoing_cases: self.ongoing_cases,
    })
  }
}

pub const INVOICE_COLUMNS: &str = "id, number, rentas, registro, payment_method, state,
   date, escritura, protocolist, total";

pub struct RawInvoice {
  pub id:             i64,
  pub number:         i64,
  pub rentas:         f64,
  pub registro:       f64,
  pub payment_method: String,
  pub state:          String,
  pub date:           String,
  pub escritura:      i64,
  pub protocolist:    String,
  pub total:          f64,
}

impl RawInvoice {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      number:         row.get(1)?,
      rentas:         row.get(2)?,
      registro:       row.get(3)?,
      payment_method: row.get(4)?,
      state:          row.get(5)?,
      date:           row.get(6)?,
      escritura:      row.get(7)?,
      protocolist:    row.get(8)?,
      total:          row.get(9)?,
    })
  }

  pub fn into_invoice(self) -> Result<Invoice> {
    Ok(Invoice {
      id:      self.id,
      details: NewInvoice {
        number:         self.number,
        rentas:         self.rentas,
        registro:       self.registro,
        payment_method: decode_payment_method(&self.payment_method)?,
        state:          decode_payment_state(&self.state)?,
        date:           decode_date(&self.date)?,
        escritura:      self.escritura,
        protocolist:    self.protocolist,
        total:          self.total,
      },
    })
  }
}
