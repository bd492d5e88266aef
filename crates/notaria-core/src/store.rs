//! The `OfficeStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `notaria-store-sqlite`).
//! Higher layers (`notaria-api`, the lifecycle service) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  case::{CaseDraft, CaseId, CaseRecord, CaseStatus, Conflict},
  invoice::{Invoice, InvoiceId, NewInvoice},
  protocolist::{NewProtocolist, Protocolist, ProtocolistId},
  validate::Checked,
};

/// Abstraction over the office's relational store.
///
/// Writes that can violate a uniqueness rule return [`Checked`] inside the
/// outer `Result`: the outer error is an infrastructure failure, the inner
/// one a business rejection. Backends must enforce uniqueness atomically with
/// the write; a prior lookup by the caller is advisory only.
///
/// Updates and deletes report the number of affected rows; `0` means the id
/// does not exist and is not an error.
pub trait OfficeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Cases: uniqueness lookups ─────────────────────────────────────────

  /// Any stored case with this `radicado`, other than `exclude`.
  fn radicado_conflict<'a>(
    &'a self,
    radicado: &'a str,
    exclude: Option<CaseId>,
  ) -> impl Future<Output = Result<Option<Conflict>, Self::Error>> + Send + 'a;

  /// Any stored case with this `(escritura, document_date)`, other than
  /// `exclude`.
  fn escritura_conflict<'a>(
    &'a self,
    escritura: &'a str,
    document_date: NaiveDate,
    exclude: Option<CaseId>,
  ) -> impl Future<Output = Result<Option<Conflict>, Self::Error>> + Send + 'a;

  // ── Cases: writes ─────────────────────────────────────────────────────

  /// Persist a screened draft as a new `in_progress` case. The id and
  /// `last_modified` are assigned by the store.
  fn insert_case(
    &self,
    draft: CaseDraft,
  ) -> impl Future<Output = Result<Checked<CaseRecord>, Self::Error>> + Send + '_;

  /// Overwrite the editable fields of case `id` with `draft` and refresh
  /// `last_modified`. `creation_date` and `status` are never touched.
  fn update_case(
    &self,
    id: CaseId,
    draft: CaseDraft,
  ) -> impl Future<Output = Result<Checked<u64>, Self::Error>> + Send + '_;

  fn delete_case(
    &self,
    id: CaseId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Flip an `in_progress` case to `finished` and return it. Returns `None`
  /// when no `in_progress` case has this id.
  fn finish_case(
    &self,
    id: CaseId,
  ) -> impl Future<Output = Result<Option<CaseRecord>, Self::Error>> + Send + '_;

  // ── Cases: reads ──────────────────────────────────────────────────────

  fn get_case(
    &self,
    id: CaseId,
  ) -> impl Future<Output = Result<Option<CaseRecord>, Self::Error>> + Send + '_;

  /// All cases ordered by id, optionally restricted to one status.
  fn list_cases(
    &self,
    status: Option<CaseStatus>,
  ) -> impl Future<Output = Result<Vec<CaseRecord>, Self::Error>> + Send + '_;

  // ── Protocolists ──────────────────────────────────────────────────────

  /// Rejects with `DuplicateEmail` when the email is taken.
  fn add_protocolist(
    &self,
    input: NewProtocolist,
  ) -> impl Future<Output = Result<Checked<Protocolist>, Self::Error>> + Send + '_;

  /// Rejects with `DuplicateEmail` when another protocolist has the email.
  fn update_protocolist(
    &self,
    id: ProtocolistId,
    input: NewProtocolist,
  ) -> impl Future<Output = Result<Checked<u64>, Self::Error>> + Send + '_;

  /// Cases referencing the protocolist are left untouched.
  fn delete_protocolist(
    &self,
    id: ProtocolistId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn get_protocolist(
    &self,
    id: ProtocolistId,
  ) -> impl Future<Output = Result<Option<Protocolist>, Self::Error>> + Send + '_;

  fn list_protocolists(
    &self,
  ) -> impl Future<Output = Result<Vec<Protocolist>, Self::Error>> + Send + '_;

  /// The escrituras of every case assigned to the protocolist.
  fn escrituras_for(
    &self,
    id: ProtocolistId,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Invoices ──────────────────────────────────────────────────────────

  fn add_invoice(
    &self,
    input: NewInvoice,
  ) -> impl Future<Output = Result<Invoice, Self::Error>> + Send + '_;

  fn update_invoice(
    &self,
    id: InvoiceId,
    input: NewInvoice,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn delete_invoice(
    &self,
    id: InvoiceId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn get_invoice(
    &self,
    id: InvoiceId,
  ) -> impl Future<Output = Result<Option<Invoice>, Self::Error>> + Send + '_;

  fn list_invoices(
    &self,
  ) -> impl Future<Output = Result<Vec<Invoice>, Self::Error>> + Send + '_;
}
