//! Invoices (`facturas`). Plain CRUD records with field checks; no lifecycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type InvoiceId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Pse,
  Efectivo,
}

/// Whether the invoice has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
  #[serde(rename = "cancelado")]
  Cancelado,
  #[serde(rename = "sin cancelar")]
  SinCancelar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub id:             InvoiceId,
  #[serde(flatten)]
  pub details:        NewInvoice,
}

/// Input to create or fully replace an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
  /// Printed invoice number.
  pub number:         i64,
  /// Amount charged for rentas.
  pub rentas:         f64,
  /// Amount charged for registro.
  pub registro:       f64,
  pub payment_method: PaymentMethod,
  pub state:          PaymentState,
  pub date:           NaiveDate,
  pub escritura:      i64,
  /// Protocolist name as printed on the invoice.
  pub protocolist:    String,
  pub total:          f64,
}
