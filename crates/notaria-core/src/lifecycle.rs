//! The case record lifecycle: validate, persist, finish.
//!
//! [`CaseDesk`] is the only writer of case records. Every step is a linear
//! `await` that short-circuits on the first failure:
//!
//! 1. screen the payload (escritura format, then dates) without touching
//!    storage;
//! 2. look up a `radicado` conflict, then an `(escritura, document_date)`
//!    conflict, excluding the record's own id on update;
//! 3. hand the draft to the store, which repeats the uniqueness checks inside
//!    the write transaction and backs them with unique indexes.
//!
//! Step 2 gives the caller the same message the store would, without opening
//! a write transaction for payloads that are obviously doomed.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  case::{CaseDraft, CaseId, CasePatch, CaseRecord, NewCase},
  notify::{MailMessage, MailTransport, Notice},
  store::OfficeStore,
  validate::{Rejection, screen_case},
};

/// Result of a successful [`CaseDesk::finish`].
#[derive(Debug, Clone, Serialize)]
pub struct FinishOutcome {
  pub case:         CaseRecord,
  pub notification: Notice,
}

/// Validation gate, persistence and status transition for case records.
pub struct CaseDesk<S, M> {
  store:            Arc<S>,
  mailer:           Arc<M>,
  notify_on_finish: bool,
}

impl<S, M> Clone for CaseDesk<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:            Arc::clone(&self.store),
      mailer:           Arc::clone(&self.mailer),
      notify_on_finish: self.notify_on_finish,
    }
  }
}

impl<S, M> CaseDesk<S, M>
where
  S: OfficeStore,
  M: MailTransport,
{
  /// Notifications on finish are enabled by default.
  pub fn new(store: Arc<S>, mailer: Arc<M>) -> Self {
    Self { store, mailer, notify_on_finish: true }
  }

  pub fn with_notifications(mut self, enabled: bool) -> Self {
    self.notify_on_finish = enabled;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn mailer(&self) -> &Arc<M> { &self.mailer }

  // ── Validation gate ─────────────────────────────────────────────────────

  /// Decide whether `input` may be persisted. Read-only.
  ///
  /// On success returns the screened draft the store should write.
  pub async fn validate(
    &self,
    input: &NewCase,
    exclude: Option<CaseId>,
  ) -> Result<CaseDraft> {
    let draft = screen_case(input, today())?;
    self.check_unique(&draft, exclude).await?;
    Ok(draft)
  }

  async fn check_unique(
    &self,
    draft: &CaseDraft,
    exclude: Option<CaseId>,
  ) -> Result<()> {
    if let Some(conflict) = self
      .store
      .radicado_conflict(&draft.radicado, exclude)
      .await
      .map_err(Error::store)?
    {
      return Err(
        Rejection::DuplicateRadicado { radicado: draft.radicado.clone(), conflict }
          .into(),
      );
    }

    if let Some(conflict) = self
      .store
      .escritura_conflict(&draft.escritura, draft.document_date, exclude)
      .await
      .map_err(Error::store)?
    {
      return Err(
        Rejection::DuplicateEscritura {
          escritura: draft.escritura.clone(),
          document_date: draft.document_date,
          conflict,
        }
        .into(),
      );
    }

    Ok(())
  }

  // ── Persistence ─────────────────────────────────────────────────────────

  pub async fn create(&self, input: NewCase) -> Result<CaseRecord> {
    let draft = self.validate(&input, None).await?;
    let record = self.store.insert_case(draft).await.map_err(Error::store)??;
    tracing::info!(case_id = record.id, radicado = %record.radicado, "case created");
    Ok(record)
  }

  /// Apply `patch` to case `id`. Returns the number of rows changed; `0`
  /// means the case does not exist.
  pub async fn update(&self, id: CaseId, patch: CasePatch) -> Result<u64> {
    let Some(current) = self.store.get_case(id).await.map_err(Error::store)?
    else {
      return Ok(0);
    };

    let draft = self.validate(&patch.merge_onto(&current), Some(id)).await?;
    let changed = self.store.update_case(id, draft).await.map_err(Error::store)??;
    tracing::info!(case_id = id, changed, "case updated");
    Ok(changed)
  }

  /// Remove case `id`. Returns `0` when it does not exist.
  pub async fn delete(&self, id: CaseId) -> Result<u64> {
    let deleted = self.store.delete_case(id).await.map_err(Error::store)?;
    tracing::info!(case_id = id, deleted, "case deleted");
    Ok(deleted)
  }

  // ── Status transition ───────────────────────────────────────────────────

  /// Move case `id` from `in_progress` to `finished`.
  ///
  /// Fails with [`Error::CaseNotFound`] when the case does not exist or is
  /// already finished. Once the status change is stored it stands; a failed
  /// notification is reported through [`FinishOutcome::notification`].
  pub async fn finish(&self, id: CaseId) -> Result<FinishOutcome> {
    let case = self
      .store
      .finish_case(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CaseNotFound(id))?;
    tracing::info!(case_id = id, "case finished");

    let notification = if self.notify_on_finish {
      self.notify_finished(&case).await
    } else {
      Notice::Disabled
    };

    Ok(FinishOutcome { case, notification })
  }

  async fn notify_finished(&self, case: &CaseRecord) -> Notice {
    let protocolist = match self.store.get_protocolist(case.protocolist_id).await {
      Ok(Some(p)) => p,
      Ok(None) => {
        return Notice::Skipped {
          reason: format!("protocolist {} not found", case.protocolist_id),
        };
      }
      Err(e) => {
        tracing::warn!(case_id = case.id, error = %e, "protocolist lookup failed");
        return Notice::Failed {
          reason: format!("could not look up protocolist: {e}"),
        };
      }
    };

    let message = MailMessage::case_finished(case, &protocolist);
    let to = message.to.clone();
    match self.mailer.send(message).await {
      Ok(()) => Notice::Sent { to },
      Err(e) => {
        tracing::warn!(case_id = case.id, %to, error = %e, "notification failed");
        Notice::Failed { reason: format!("sending to {to} failed: {e}") }
      }
    }
  }
}

fn today() -> NaiveDate { Utc::now().date_naive() }
