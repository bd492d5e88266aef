//! Handlers for `/case-rents` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/case-rents` | Optional `?status=in_progress\|finished` |
//! | `POST`   | `/case-rents` | Runs the validation gate; 201 with the new id |
//! | `GET`    | `/case-rents/:id` | 404 if not found |
//! | `PUT`    | `/case-rents/:id` | Partial update, re-validated excluding itself |
//! | `DELETE` | `/case-rents/:id` | 404 if nothing was deleted |
//! | `POST`   | `/case-rents/:id/finish` | `in_progress → finished`, then notify |
//! | `GET`    | `/case-rents-finished` | Finished cases only |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use notaria_core::{
  case::{CaseId, CasePatch, CaseRecord, CaseStatus, NewCase},
  lifecycle::CaseDesk,
  notify::{MailTransport, Notice},
  store::OfficeStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  extract::{Json, Path, Query},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<CaseStatus>,
}

/// `GET /case-rents[?status=<status>]`
pub async fn list<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CaseRecord>>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let cases = desk
    .store()
    .list_cases(params.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(cases))
}

/// `GET /case-rents-finished`
pub async fn list_finished<S, M>(
  State(desk): State<CaseDesk<S, M>>,
) -> Result<Json<Vec<CaseRecord>>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let cases = desk
    .store()
    .list_cases(Some(CaseStatus::Finished))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(cases))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Created {
  pub id:   CaseId,
  pub case: CaseRecord,
}

/// `POST /case-rents`
pub async fn create<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Json(body): Json<NewCase>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let case = desk.create(body).await?;
  Ok((StatusCode::CREATED, Json(Created { id: case.id, case })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /case-rents/:id`
pub async fn get_one<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<CaseId>,
) -> Result<Json<CaseRecord>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  desk
    .store()
    .get_case(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("case {id} not found")))
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Updated {
  pub updated_rows: u64,
}

/// `PUT /case-rents/:id` — absent fields keep their stored value.
pub async fn update<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<CaseId>,
  Json(patch): Json<CasePatch>,
) -> Result<Json<Updated>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  match desk.update(id, patch).await? {
    0 => Err(ApiError::NotFound(format!("case {id} not found"))),
    updated_rows => Ok(Json(Updated { updated_rows })),
  }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
  pub deleted_rows: u64,
}

/// `DELETE /case-rents/:id`
pub async fn delete<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<CaseId>,
) -> Result<Json<Deleted>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  match desk.delete(id).await? {
    0 => Err(ApiError::NotFound(format!("case {id} not found"))),
    deleted_rows => Ok(Json(Deleted { deleted_rows })),
  }
}

// ─── Finish ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Finished {
  pub case:         CaseRecord,
  pub notification: Notice,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warning:      Option<String>,
}

/// `POST /case-rents/:id/finish`
///
/// A notification failure is reported in `warning`; the case stays finished.
pub async fn finish<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<CaseId>,
) -> Result<Json<Finished>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let outcome = desk.finish(id).await?;
  Ok(Json(Finished {
    warning:      outcome.notification.warning(),
    case:         outcome.case,
    notification: outcome.notification,
  }))
}
