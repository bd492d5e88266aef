//! Integration tests for `SqliteStore` against an in-memory database, plus
//! the `CaseDesk` lifecycle running on top of it.

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use chrono::{Days, NaiveDate, Utc};
use notaria_core::{
  Error, Rejection,
  case::{CasePatch, CaseStatus, NewCase},
  invoice::{NewInvoice, PaymentMethod, PaymentState},
  lifecycle::CaseDesk,
  notify::{MailMessage, MailTransport, Notice},
  protocolist::NewProtocolist,
  store::OfficeStore,
  validate::screen_case,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn today() -> NaiveDate { Utc::now().date_naive() }

fn case(escritura: &str, radicado: &str, document_date: &str) -> NewCase {
  NewCase {
    creation_date:  Some("2024-01-01".into()),
    document_date:  document_date.into(),
    escritura:      escritura.into(),
    radicado:       radicado.into(),
    protocolist_id: 1,
    observaciones:  None,
  }
}

fn protocolist(email: &str) -> NewProtocolist {
  NewProtocolist {
    complete_name: "Ana".into(),
    last_name:     "Gómez".into(),
    email:         email.into(),
    observations:  None,
  }
}

// ─── Test mailer ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("relay unreachable")]
struct RelayDown;

/// Records every message; refuses all of them when `fail` is set.
#[derive(Default)]
struct RecordingMailer {
  sent: Mutex<Vec<MailMessage>>,
  fail: bool,
}

impl RecordingMailer {
  fn failing() -> Self { Self { fail: true, ..Self::default() } }

  fn sent(&self) -> Vec<MailMessage> { self.sent.lock().unwrap().clone() }
}

impl MailTransport for RecordingMailer {
  type Error = RelayDown;

  async fn send(&self, message: MailMessage) -> Result<(), RelayDown> {
    if self.fail {
      return Err(RelayDown);
    }
    self.sent.lock().unwrap().push(message);
    Ok(())
  }
}

async fn desk() -> (CaseDesk<SqliteStore, RecordingMailer>, Arc<RecordingMailer>) {
  let mailer = Arc::new(RecordingMailer::default());
  (CaseDesk::new(Arc::new(store().await), Arc::clone(&mailer)), mailer)
}

// ─── Store: cases ────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_case() {
  let s = store().await;
  let draft = screen_case(&case("12345", "R-001", "2024-01-01"), today()).unwrap();

  let created = s.insert_case(draft).await.unwrap().unwrap();
  assert_eq!(created.status, CaseStatus::InProgress);

  let fetched = s.get_case(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_case_missing_returns_none() {
  let s = store().await;
  assert!(s.get_case(42).await.unwrap().is_none());
}

#[tokio::test]
async fn store_rejects_duplicate_radicado_without_prior_lookup() {
  let s = store().await;
  let first = screen_case(&case("1", "R-001", "2024-01-01"), today()).unwrap();
  let id = s.insert_case(first).await.unwrap().unwrap().id;

  let second = screen_case(&case("2", "R-001", "2024-01-02"), today()).unwrap();
  let rejection = s.insert_case(second).await.unwrap().unwrap_err();
  match rejection {
    Rejection::DuplicateRadicado { conflict, .. } => assert_eq!(conflict.case_id, id),
    other => panic!("unexpected rejection: {other:?}"),
  }
}

#[tokio::test]
async fn store_rejects_duplicate_escritura_on_same_date() {
  let s = store().await;
  let first = screen_case(&case("77", "R-001", "2024-01-01"), today()).unwrap();
  s.insert_case(first).await.unwrap().unwrap();

  let clash = screen_case(&case("77", "R-002", "2024-01-01"), today()).unwrap();
  assert!(matches!(
    s.insert_case(clash).await.unwrap(),
    Err(Rejection::DuplicateEscritura { .. })
  ));

  // Same escritura on another date is a different deed.
  let other_day = screen_case(&case("77", "R-003", "2024-01-02"), today()).unwrap();
  assert!(s.insert_case(other_day).await.unwrap().is_ok());
}

#[tokio::test]
async fn conflict_names_the_assigned_protocolist() {
  let s = store().await;
  let p = s.add_protocolist(protocolist("ana@notaria.co")).await.unwrap().unwrap();
  let mut input = case("5", "R-009", "2024-02-02");
  input.protocolist_id = p.id;
  let draft = screen_case(&input, today()).unwrap();
  let id = s.insert_case(draft).await.unwrap().unwrap().id;

  let conflict = s.radicado_conflict("R-009", None).await.unwrap().unwrap();
  assert_eq!(conflict.case_id, id);
  assert_eq!(conflict.protocolist.as_deref(), Some("Ana Gómez"));

  assert!(s.radicado_conflict("R-009", Some(id)).await.unwrap().is_none());
}

#[tokio::test]
async fn conflict_with_orphaned_case_is_still_reported() {
  let s = store().await;
  let mut input = case("5", "R-010", "2024-02-02");
  input.protocolist_id = 999;
  s.insert_case(screen_case(&input, today()).unwrap()).await.unwrap().unwrap();

  let date = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
  let conflict = s.escritura_conflict("5", date, None).await.unwrap().unwrap();
  assert!(conflict.protocolist.is_none());
}

#[tokio::test]
async fn update_missing_case_changes_nothing() {
  let s = store().await;
  let draft = screen_case(&case("1", "R-001", "2024-01-01"), today()).unwrap();
  assert_eq!(s.update_case(5, draft).await.unwrap().unwrap(), 0);
}

#[tokio::test]
async fn finish_case_flips_status_once() {
  let s = store().await;
  let draft = screen_case(&case("1", "R-001", "2024-01-01"), today()).unwrap();
  let id = s.insert_case(draft).await.unwrap().unwrap().id;

  let finished = s.finish_case(id).await.unwrap().unwrap();
  assert_eq!(finished.status, CaseStatus::Finished);
  assert!(s.finish_case(id).await.unwrap().is_none());
  assert!(s.finish_case(id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn finish_case_stamps_a_fresh_last_modified() {
  let s = store().await;
  let draft = screen_case(&case("1", "R-001", "2024-01-01"), today()).unwrap();
  let created = s.insert_case(draft).await.unwrap().unwrap();

  tokio::time::sleep(Duration::from_millis(5)).await;
  let finished = s.finish_case(created.id).await.unwrap().unwrap();
  assert!(finished.last_modified > created.last_modified);
  assert_eq!(s.get_case(created.id).await.unwrap(), Some(finished));
}

#[tokio::test]
async fn finishing_a_finished_case_leaves_the_row_untouched() {
  let s = store().await;
  let draft = screen_case(&case("1", "R-001", "2024-01-01"), today()).unwrap();
  let id = s.insert_case(draft).await.unwrap().unwrap().id;
  s.finish_case(id).await.unwrap().unwrap();

  let before = s.get_case(id).await.unwrap().unwrap();
  tokio::time::sleep(Duration::from_millis(5)).await;
  assert!(s.finish_case(id).await.unwrap().is_none());
  let after = s.get_case(id).await.unwrap().unwrap();
  assert_eq!(after, before);
  assert_eq!(after.last_modified, before.last_modified);
}

#[tokio::test]
async fn list_cases_filters_by_status() {
  let s = store().await;
  for (i, r) in ["R-1", "R-2", "R-3"].iter().enumerate() {
    let draft = screen_case(&case(&(i + 1).to_string(), r, "2024-01-01"), today()).unwrap();
    s.insert_case(draft).await.unwrap().unwrap();
  }
  s.finish_case(2).await.unwrap().unwrap();

  assert_eq!(s.list_cases(None).await.unwrap().len(), 3);
  let ongoing = s.list_cases(Some(CaseStatus::InProgress)).await.unwrap();
  assert_eq!(ongoing.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 3]);
  let finished = s.list_cases(Some(CaseStatus::Finished)).await.unwrap();
  assert_eq!(finished.len(), 1);
  assert_eq!(finished[0].radicado, "R-2");
}

#[tokio::test]
async fn delete_case_reports_rows() {
  let s = store().await;
  let draft = screen_case(&case("1", "R-001", "2024-01-01"), today()).unwrap();
  let id = s.insert_case(draft).await.unwrap().unwrap().id;

  assert_eq!(s.delete_case(id).await.unwrap(), 1);
  assert_eq!(s.delete_case(id).await.unwrap(), 0);
}

// ─── Store: protocolists ─────────────────────────────────────────────────────

#[tokio::test]
async fn ongoing_cases_counted_at_read_time() {
  let s = store().await;
  let p = s.add_protocolist(protocolist("ana@notaria.co")).await.unwrap().unwrap();
  assert_eq!(p.ongoing_cases, 0);

  for (n, r) in ["R-1", "R-2"].iter().enumerate() {
    let mut input = case(&(n + 1).to_string(), r, "2024-01-01");
    input.protocolist_id = p.id;
    s.insert_case(screen_case(&input, today()).unwrap()).await.unwrap().unwrap();
  }
  assert_eq!(s.get_protocolist(p.id).await.unwrap().unwrap().ongoing_cases, 2);

  s.finish_case(1).await.unwrap().unwrap();
  let listed = s.list_protocolists().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].ongoing_cases, 1);
}

#[tokio::test]
async fn duplicate_protocolist_email_is_rejected() {
  let s = store().await;
  let first = s.add_protocolist(protocolist("ana@notaria.co")).await.unwrap().unwrap();
  let other = s.add_protocolist(protocolist("luis@notaria.co")).await.unwrap().unwrap();

  assert_eq!(
    s.add_protocolist(protocolist("ana@notaria.co")).await.unwrap(),
    Err(Rejection::DuplicateEmail("ana@notaria.co".into()))
  );
  assert!(matches!(
    s.update_protocolist(other.id, protocolist("ana@notaria.co")).await.unwrap(),
    Err(Rejection::DuplicateEmail(_))
  ));
  // Keeping one's own email is fine.
  assert_eq!(
    s.update_protocolist(first.id, protocolist("ana@notaria.co")).await.unwrap(),
    Ok(1)
  );
}

#[tokio::test]
async fn deleting_protocolist_leaves_cases_alone() {
  let s = store().await;
  let p = s.add_protocolist(protocolist("ana@notaria.co")).await.unwrap().unwrap();
  let mut input = case("44", "R-044", "2024-01-01");
  input.protocolist_id = p.id;
  let created = s.insert_case(screen_case(&input, today()).unwrap()).await.unwrap().unwrap();

  assert_eq!(s.escrituras_for(p.id).await.unwrap(), vec!["44".to_string()]);
  assert_eq!(s.delete_protocolist(p.id).await.unwrap(), 1);

  let kept = s.get_case(created.id).await.unwrap().unwrap();
  assert_eq!(kept.protocolist_id, p.id);
  assert!(s.get_protocolist(p.id).await.unwrap().is_none());
}

// ─── Store: invoices ─────────────────────────────────────────────────────────

fn invoice(number: i64) -> NewInvoice {
  NewInvoice {
    number,
    rentas: 120_000.0,
    registro: 80_500.5,
    payment_method: PaymentMethod::Pse,
    state: PaymentState::SinCancelar,
    date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
    escritura: 321,
    protocolist: "Ana Gómez".into(),
    total: 200_500.5,
  }
}

#[tokio::test]
async fn invoice_crud() {
  let s = store().await;
  let created = s.add_invoice(invoice(1001)).await.unwrap();
  assert_eq!(s.get_invoice(created.id).await.unwrap(), Some(created.clone()));

  let mut paid = invoice(1001);
  paid.state = PaymentState::Cancelado;
  paid.payment_method = PaymentMethod::Efectivo;
  assert_eq!(s.update_invoice(created.id, paid.clone()).await.unwrap(), 1);
  assert_eq!(s.get_invoice(created.id).await.unwrap().unwrap().details, paid);

  s.add_invoice(invoice(1002)).await.unwrap();
  assert_eq!(s.list_invoices().await.unwrap().len(), 2);

  assert_eq!(s.delete_invoice(created.id).await.unwrap(), 1);
  assert_eq!(s.update_invoice(created.id, invoice(1)).await.unwrap(), 0);
  assert!(s.get_invoice(created.id).await.unwrap().is_none());
}

// ─── CaseDesk lifecycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_on_empty_store_starts_in_progress() {
  let (desk, _) = desk().await;
  let record = desk.create(case("12345", "R-001", "2024-01-01")).await.unwrap();
  assert_eq!(record.id, 1);
  assert_eq!(record.status, CaseStatus::InProgress);
}

#[tokio::test]
async fn second_case_with_same_radicado_is_rejected() {
  let (desk, _) = desk().await;
  let first = desk.create(case("12345", "R-001", "2024-01-01")).await.unwrap();

  let err = desk.create(case("999", "R-001", "2023-06-30")).await.unwrap_err();
  match err {
    Error::Rejected(Rejection::DuplicateRadicado { conflict, .. }) => {
      assert_eq!(conflict.case_id, first.id);
    }
    other => panic!("unexpected error: {other:?}"),
  }
}

#[tokio::test]
async fn radicado_is_checked_before_escritura() {
  let (desk, _) = desk().await;
  desk.create(case("10", "R-001", "2024-01-01")).await.unwrap();

  let err = desk.create(case("10", "R-001", "2024-01-01")).await.unwrap_err();
  assert!(matches!(err, Error::Rejected(Rejection::DuplicateRadicado { .. })));
}

#[tokio::test]
async fn format_is_checked_before_uniqueness() {
  let (desk, _) = desk().await;
  desk.create(case("10", "R-001", "2024-01-01")).await.unwrap();

  let err = desk.create(case("123456", "R-001", "2024-01-01")).await.unwrap_err();
  assert!(matches!(err, Error::Rejected(Rejection::InvalidFormat { .. })));
}

#[tokio::test]
async fn future_document_date_is_rejected() {
  let (desk, _) = desk().await;
  let tomorrow = today().checked_add_days(Days::new(1)).unwrap().to_string();

  let err = desk.create(case("10", "R-001", &tomorrow)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Rejected(Rejection::InvalidDate { field: "document_date", .. })
  ));
  assert!(desk.store().list_cases(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_excludes_the_record_itself() {
  let (desk, _) = desk().await;
  let created = desk.create(case("12345", "R-001", "2024-01-01")).await.unwrap();

  let patch = CasePatch { observaciones: Some(Some("firmado".into())), ..CasePatch::default() };
  assert_eq!(desk.update(created.id, patch).await.unwrap(), 1);

  let updated = desk.store().get_case(created.id).await.unwrap().unwrap();
  assert_eq!(updated.radicado, "R-001");
  assert_eq!(updated.escritura, "12345");
  assert_eq!(updated.creation_date, created.creation_date);
  assert_eq!(updated.observaciones.as_deref(), Some("firmado"));
  assert!(updated.last_modified >= created.last_modified);
}

#[tokio::test]
async fn update_into_another_cases_radicado_is_rejected() {
  let (desk, _) = desk().await;
  desk.create(case("1", "R-001", "2024-01-01")).await.unwrap();
  let second = desk.create(case("2", "R-002", "2024-01-01")).await.unwrap();

  let patch = CasePatch { radicado: Some("R-001".into()), ..CasePatch::default() };
  let err = desk.update(second.id, patch).await.unwrap_err();
  assert!(matches!(err, Error::Rejected(Rejection::DuplicateRadicado { .. })));
}

#[tokio::test]
async fn update_missing_case_returns_zero() {
  let (desk, _) = desk().await;
  assert_eq!(desk.update(8, CasePatch::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn finish_twice_is_not_found() {
  let (desk, _) = desk().await;
  let created = desk.create(case("12345", "R-001", "2024-01-01")).await.unwrap();

  let outcome = desk.finish(created.id).await.unwrap();
  assert_eq!(outcome.case.status, CaseStatus::Finished);

  let snapshot = desk.store().get_case(created.id).await.unwrap();

  let err = desk.finish(created.id).await.unwrap_err();
  assert!(matches!(err, Error::CaseNotFound(id) if id == created.id));
  assert_eq!(desk.store().get_case(created.id).await.unwrap(), snapshot);
}

#[tokio::test]
async fn finish_notifies_the_protocolist() {
  let (desk, mailer) = desk().await;
  let p = desk
    .store()
    .add_protocolist(protocolist("ana@notaria.co"))
    .await
    .unwrap()
    .unwrap();
  let mut input = case("12", "R-012", "2024-01-01");
  input.protocolist_id = p.id;
  let created = desk.create(input).await.unwrap();

  let outcome = desk.finish(created.id).await.unwrap();
  assert_eq!(outcome.notification, Notice::Sent { to: "ana@notaria.co".into() });

  let sent = mailer.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].subject, "Case R-012 finished");
  assert!(sent[0].body.contains("Ana Gómez"));
}

#[tokio::test]
async fn finish_without_protocolist_skips_notification() {
  let (desk, mailer) = desk().await;
  let created = desk.create(case("12", "R-012", "2024-01-01")).await.unwrap();

  let outcome = desk.finish(created.id).await.unwrap();
  assert!(matches!(outcome.notification, Notice::Skipped { .. }));
  assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn mail_failure_does_not_undo_finish() {
  let store = Arc::new(store().await);
  let p = store.add_protocolist(protocolist("ana@notaria.co")).await.unwrap().unwrap();
  let desk = CaseDesk::new(Arc::clone(&store), Arc::new(RecordingMailer::failing()));

  let mut input = case("12", "R-012", "2024-01-01");
  input.protocolist_id = p.id;
  let created = desk.create(input).await.unwrap();

  let outcome = desk.finish(created.id).await.unwrap();
  assert!(matches!(outcome.notification, Notice::Failed { .. }));
  assert!(outcome.notification.warning().is_some());

  let stored = store.get_case(created.id).await.unwrap().unwrap();
  assert_eq!(stored.status, CaseStatus::Finished);
}

#[tokio::test]
async fn disabled_notifications_send_nothing() {
  let (desk, mailer) = desk().await;
  let desk = desk.with_notifications(false);
  let created = desk.create(case("12", "R-012", "2024-01-01")).await.unwrap();

  let outcome = desk.finish(created.id).await.unwrap();
  assert_eq!(outcome.notification, Notice::Disabled);
  assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn finished_cases_still_block_duplicates() {
  let (desk, _) = desk().await;
  let created = desk.create(case("12", "R-012", "2024-01-01")).await.unwrap();
  desk.finish(created.id).await.unwrap();

  let err = desk.create(case("13", "R-012", "2024-01-01")).await.unwrap_err();
  assert!(matches!(err, Error::Rejected(Rejection::DuplicateRadicado { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_one_radicado_store_one_row() {
  let (desk, _) = desk().await;

  let tasks: Vec<_> = (1..=16)
    .map(|n| {
      let desk = desk.clone();
      tokio::spawn(async move {
        desk.create(case(&n.to_string(), "R-RACE", "2024-01-01")).await
      })
    })
    .collect();

  let mut created = 0;
  for task in tasks {
    match task.await.unwrap() {
      Ok(_) => created += 1,
      Err(Error::Rejected(Rejection::DuplicateRadicado { .. })) => {}
      Err(other) => panic!("unexpected error: {other:?}"),
    }
  }

  assert_eq!(created, 1);
  assert_eq!(desk.store().list_cases(None).await.unwrap().len(), 1);
}
