//! [`SqliteStore`] — the SQLite implementation of [`OfficeStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use notaria_core::{
  case::{CaseDraft, CaseId, CaseRecord, CaseStatus, Conflict},
  invoice::{Invoice, InvoiceId, NewInvoice},
  protocolist::{NewProtocolist, Protocolist, ProtocolistId},
  store::OfficeStore,
  validate::{Checked, Rejection},
};

use crate::{
  Result,
  encode::{
    CASE_COLUMNS, INVOICE_COLUMNS, PROTOCOLIST_COLUMNS, RawCase, RawConflict,
    RawInvoice, RawProtocolist, encode_date, encode_dt, encode_payment_method,
    encode_payment_state, encode_status,
  },
  schema::SCHEMA,
};

// ─── Conflict queries ────────────────────────────────────────────────────────

// LEFT JOIN: a case whose protocolist was deleted still blocks duplicates.
const RADICADO_CONFLICT_SQL: &str = "
  SELECT c.id, p.complete_name, p.last_name
  FROM case_rents c
  LEFT JOIN protocolist_rents p ON p.id = c.protocolist_id
  WHERE c.radicado = ?1
    AND (?2 IS NULL OR c.id != ?2)
  ORDER BY c.id
  LIMIT 1";

const ESCRITURA_CONFLICT_SQL: &str = "
  SELECT c.id, p.complete_name, p.last_name
  FROM case_rents c
  LEFT JOIN protocolist_rents p ON p.id = c.protocolist_id
  WHERE c.escritura = ?1
    AND c.document_date = ?2
    AND (?3 IS NULL OR c.id != ?3)
  ORDER BY c.id
  LIMIT 1";

fn raw_conflict(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawConflict> {
  Ok(RawConflict {
    case_id:       row.get(0)?,
    complete_name: row.get(1)?,
    last_name:     row.get(2)?,
  })
}

fn query_radicado_conflict(
  conn: &rusqlite::Connection,
  radicado: &str,
  exclude: Option<CaseId>,
) -> rusqlite::Result<Option<RawConflict>> {
  conn
    .query_row(RADICADO_CONFLICT_SQL, rusqlite::params![radicado, exclude], raw_conflict)
    .optional()
}

fn query_escritura_conflict(
  conn: &rusqlite::Connection,
  escritura: &str,
  document_date: &str,
  exclude: Option<CaseId>,
) -> rusqlite::Result<Option<RawConflict>> {
  conn
    .query_row(
      ESCRITURA_CONFLICT_SQL,
      rusqlite::params![escritura, document_date, exclude],
      raw_conflict,
    )
    .optional()
}

/// The uniqueness rule a case write ran into.
enum Clash {
  Radicado(RawConflict),
  Escritura(RawConflict),
}

/// Column values of a case write, owned so they can cross into the
/// connection thread.
struct CaseRow {
  creation_date:  String,
  document_date:  String,
  escritura:      String,
  radicado:       String,
  protocolist_id: ProtocolistId,
  observaciones:  Option<String>,
}

impl CaseRow {
  fn from_draft(draft: &CaseDraft) -> Self {
    Self {
      creation_date:  encode_date(draft.creation_date),
      document_date:  encode_date(draft.document_date),
      escritura:      draft.escritura.clone(),
      radicado:       draft.radicado.clone(),
      protocolist_id: draft.protocolist_id,
      observaciones:  draft.observaciones.clone(),
    }
  }

  /// Radicado first, then escritura + date.
  fn find_clash(
    &self,
    conn: &rusqlite::Connection,
    exclude: Option<CaseId>,
  ) -> rusqlite::Result<Option<Clash>> {
    if let Some(c) = query_radicado_conflict(conn, &self.radicado, exclude)? {
      return Ok(Some(Clash::Radicado(c)));
    }
    Ok(
      query_escritura_conflict(conn, &self.escritura, &self.document_date, exclude)?
        .map(Clash::Escritura),
    )
  }
}

fn clash_to_rejection(clash: Clash, draft: &CaseDraft) -> Rejection {
  match clash {
    Clash::Radicado(raw) => Rejection::DuplicateRadicado {
      radicado: draft.radicado.clone(),
      conflict: raw.into_conflict(),
    },
    Clash::Escritura(raw) => Rejection::DuplicateEscritura {
      escritura:     draft.escritura.clone(),
      document_date: draft.document_date,
      conflict:      raw.into_conflict(),
    },
  }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The office store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All writes
/// go through one connection thread, and every check-then-write runs inside a
/// single `BEGIN IMMEDIATE` transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "store opened");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── OfficeStore impl ────────────────────────────────────────────────────────

impl OfficeStore for SqliteStore {
  type Error = crate::Error;

  // ── Cases: uniqueness lookups ─────────────────────────────────────────────

  async fn radicado_conflict<'a>(
    &'a self,
    radicado: &'a str,
    exclude: Option<CaseId>,
  ) -> Result<Option<Conflict>> {
    let radicado = radicado.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(query_radicado_conflict(conn, &radicado, exclude)?))
      .await?;
    Ok(raw.map(RawConflict::into_conflict))
  }

  async fn escritura_conflict<'a>(
    &'a self,
    escritura: &'a str,
    document_date: NaiveDate,
    exclude: Option<CaseId>,
  ) -> Result<Option<Conflict>> {
    let escritura = escritura.to_owned();
    let date_str  = encode_date(document_date);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(query_escritura_conflict(conn, &escritura, &date_str, exclude)?)
      })
      .await?;
    Ok(raw.map(RawConflict::into_conflict))
  }

  // ── Cases: writes ─────────────────────────────────────────────────────────

  async fn insert_case(&self, draft: CaseDraft) -> Result<Checked<CaseRecord>> {
    let row           = CaseRow::from_draft(&draft);
    let last_modified = Utc::now();
    let modified_str  = encode_dt(last_modified);
    let status_str    = encode_status(CaseStatus::InProgress);

    let outcome: std::result::Result<CaseId, Clash> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(clash) = row.find_clash(&tx, None)? {
          return Ok(Err(clash));
        }

        let inserted = tx.execute(
          "INSERT INTO case_rents (
             creation_date, document_date, escritura, radicado,
             protocolist_id, observaciones, status, last_modified
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            row.creation_date,
            row.document_date,
            row.escritura,
            row.radicado,
            row.protocolist_id,
            row.observaciones,
            status_str,
            modified_str,
          ],
        );

        // The unique indexes are authoritative: a violation the lookups did
        // not see becomes the same rejection.
        if let Err(e) = inserted {
          if is_unique_violation(&e) {
            if let Some(clash) = row.find_clash(&tx, None)? {
              return Ok(Err(clash));
            }
          }
          return Err(e.into());
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok(id))
      })
      .await?;

    Ok(match outcome {
      Ok(id) => Ok(CaseRecord {
        id,
        creation_date: draft.creation_date,
        document_date: draft.document_date,
        escritura: draft.escritura,
        radicado: draft.radicado,
        protocolist_id: draft.protocolist_id,
        observaciones: draft.observaciones,
        status: CaseStatus::InProgress,
        last_modified,
      }),
      Err(clash) => {
        tracing::debug!(radicado = %draft.radicado, "case insert rejected");
        Err(clash_to_rejection(clash, &draft))
      }
    })
  }

  async fn update_case(&self, id: CaseId, draft: CaseDraft) -> Result<Checked<u64>> {
    let row          = CaseRow::from_draft(&draft);
    let modified_str = encode_dt(Utc::now());

    let outcome: std::result::Result<usize, Clash> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
          .query_row("SELECT 1 FROM case_rents WHERE id = ?1", rusqlite::params![id], |_| {
            Ok(true)
          })
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(Ok(0));
        }

        if let Some(clash) = row.find_clash(&tx, Some(id))? {
          return Ok(Err(clash));
        }

        let updated = tx.execute(
          "UPDATE case_rents
           SET document_date = ?1, escritura = ?2, radicado = ?3,
               protocolist_id = ?4, observaciones = ?5, last_modified = ?6
           WHERE id = ?7",
          rusqlite::params![
            row.document_date,
            row.escritura,
            row.radicado,
            row.protocolist_id,
            row.observaciones,
            modified_str,
            id,
          ],
        );

        let changed = match updated {
          Ok(n) => n,
          Err(e) => {
            if is_unique_violation(&e) {
              if let Some(clash) = row.find_clash(&tx, Some(id))? {
                return Ok(Err(clash));
              }
            }
            return Err(e.into());
          }
        };

        tx.commit()?;
        Ok(Ok(changed))
      })
      .await?;

    Ok(match outcome {
      Ok(n) => Ok(n as u64),
      Err(clash) => Err(clash_to_rejection(clash, &draft)),
    })
  }

  async fn delete_case(&self, id: CaseId) -> Result<u64> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM case_rents WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(deleted as u64)
  }

  async fn finish_case(&self, id: CaseId) -> Result<Option<CaseRecord>> {
    let modified_str = encode_dt(Utc::now());

    let raw: Option<RawCase> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let changed = tx.execute(
          "UPDATE case_rents
           SET status = 'finished', last_modified = ?1
           WHERE id = ?2 AND status = 'in_progress'",
          rusqlite::params![modified_str, id],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let raw = tx.query_row(
          &format!("SELECT {CASE_COLUMNS} FROM case_rents WHERE id = ?1"),
          rusqlite::params![id],
          RawCase::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawCase::into_record).transpose()
  }

  // ── Cases: reads ──────────────────────────────────────────────────────────

  async fn get_case(&self, id: CaseId) -> Result<Option<CaseRecord>> {
    let raw: Option<RawCase> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CASE_COLUMNS} FROM case_rents WHERE id = ?1"),
              rusqlite::params![id],
              RawCase::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCase::into_record).transpose()
  }

  async fn list_cases(&self, status: Option<CaseStatus>) -> Result<Vec<CaseRecord>> {
    let status_str = status.map(encode_status);

    let raws: Vec<RawCase> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CASE_COLUMNS} FROM case_rents
           WHERE ?1 IS NULL OR status = ?1
           ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status_str], RawCase::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCase::into_record).collect()
  }

  // ── Protocolists ──────────────────────────────────────────────────────────

  async fn add_protocolist(&self, input: NewProtocolist) -> Result<Checked<Protocolist>> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let email      = input.email.clone();
    let name       = input.complete_name.clone();
    let last_name  = input.last_name.clone();
    let notes      = input.observations.clone();

    let outcome: Checked<ProtocolistId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let taken = tx
          .query_row(
            "SELECT 1 FROM protocolist_rents WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(Err(Rejection::DuplicateEmail(email)));
        }

        let inserted = tx.execute(
          "INSERT INTO protocolist_rents
             (created_at, complete_name, last_name, email, observations)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![at_str, name, last_name, email, notes],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(Rejection::DuplicateEmail(email)));
          }
          Err(e) => return Err(e.into()),
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok(id))
      })
      .await?;

    Ok(outcome.map(|id| Protocolist {
      id,
      created_at,
      complete_name: input.complete_name,
      last_name: input.last_name,
      email: input.email,
      observations: input.observations,
      ongoing_cases: 0,
    }))
  }

  async fn update_protocolist(
    &self,
    id: ProtocolistId,
    input: NewProtocolist,
  ) -> Result<Checked<u64>> {
    let outcome: Checked<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let taken = tx
          .query_row(
            "SELECT 1 FROM protocolist_rents WHERE email = ?1 AND id != ?2",
            rusqlite::params![input.email, id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(Err(Rejection::DuplicateEmail(input.email)));
        }

        let updated = tx.execute(
          "UPDATE protocolist_rents
           SET complete_name = ?1, last_name = ?2, email = ?3, observations = ?4
           WHERE id = ?5",
          rusqlite::params![
            input.complete_name,
            input.last_name,
            input.email,
            input.observations,
            id,
          ],
        );
        let changed = match updated {
          Ok(n) => n,
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(Rejection::DuplicateEmail(input.email)));
          }
          Err(e) => return Err(e.into()),
        };

        tx.commit()?;
        Ok(Ok(changed))
      })
      .await?;

    Ok(outcome.map(|n| n as u64))
  }

  async fn delete_protocolist(&self, id: ProtocolistId) -> Result<u64> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(
          conn.execute(
            "DELETE FROM protocolist_rents WHERE id = ?1",
            rusqlite::params![id],
          )?,
        )
      })
      .await?;
    Ok(deleted as u64)
  }

  async fn get_protocolist(&self, id: ProtocolistId) -> Result<Option<Protocolist>> {
    let raw: Option<RawProtocolist> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PROTOCOLIST_COLUMNS}
                 FROM protocolist_rents p
                 LEFT JOIN case_rents c
                   ON c.protocolist_id = p.id AND c.status = 'in_progress'
                 WHERE p.id = ?1
                 GROUP BY p.id"
              ),
              rusqlite::params![id],
              RawProtocolist::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProtocolist::into_protocolist).transpose()
  }

  async fn list_protocolists(&self) -> Result<Vec<Protocolist>> {
    let raws: Vec<RawProtocolist> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROTOCOLIST_COLUMNS}
           FROM protocolist_rents p
           LEFT JOIN case_rents c
             ON c.protocolist_id = p.id AND c.status = 'in_progress'
           GROUP BY p.id
           ORDER BY p.id"
        ))?;
        let rows = stmt
          .query_map([], RawProtocolist::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProtocolist::into_protocolist).collect()
  }

  async fn escrituras_for(&self, id: ProtocolistId) -> Result<Vec<String>> {
    let escrituras = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT escritura FROM case_rents WHERE protocolist_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(escrituras)
  }

  // ── Invoices ──────────────────────────────────────────────────────────────

  async fn add_invoice(&self, input: NewInvoice) -> Result<Invoice> {
    let row = input.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO facturas (
             number, rentas, registro, payment_method, state,
             date, escritura, protocolist, total
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            row.number,
            row.rentas,
            row.registro,
            encode_payment_method(row.payment_method),
            encode_payment_state(row.state),
            encode_date(row.date),
            row.escritura,
            row.protocolist,
            row.total,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Invoice { id, details: input })
  }

  async fn update_invoice(&self, id: InvoiceId, input: NewInvoice) -> Result<u64> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE facturas
           SET number = ?1, rentas = ?2, registro = ?3, payment_method = ?4,
               state = ?5, date = ?6, escritura = ?7, protocolist = ?8, total = ?9
           WHERE id = ?10",
          rusqlite::params![
            input.number,
            input.rentas,
            input.registro,
            encode_payment_method(input.payment_method),
            encode_payment_state(input.state),
            encode_date(input.date),
            input.escritura,
            input.protocolist,
            input.total,
            id,
          ],
        )?)
      })
      .await?;
    Ok(changed as u64)
  }

  async fn delete_invoice(&self, id: InvoiceId) -> Result<u64> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM facturas WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(deleted as u64)
  }

  async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
    let raw: Option<RawInvoice> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {INVOICE_COLUMNS} FROM facturas WHERE id = ?1"),
              rusqlite::params![id],
              RawInvoice::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInvoice::into_invoice).transpose()
  }

  async fn list_invoices(&self) -> Result<Vec<Invoice>> {
    let raws: Vec<RawInvoice> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {INVOICE_COLUMNS} FROM facturas ORDER BY id"))?;
        let rows = stmt
          .query_map([], RawInvoice::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInvoice::into_invoice).collect()
  }
}
