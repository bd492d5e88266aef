//! Handlers for `/protocolist-rents` endpoints.
//!
//! Listing and lookups carry `ongoing_cases`, counted when read.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use notaria_core::{
  lifecycle::CaseDesk,
  notify::MailTransport,
  protocolist::{NewProtocolist, Protocolist, ProtocolistId},
  store::OfficeStore,
  validate::check_protocolist,
};

use crate::{
  cases::{Deleted, Updated},
  error::ApiError,
  extract::{Json, Path},
};

fn not_found(id: ProtocolistId) -> ApiError {
  ApiError::NotFound(format!("protocolist {id} not found"))
}

/// `GET /protocolist-rents`
pub async fn list<S, M>(
  State(desk): State<CaseDesk<S, M>>,
) -> Result<Json<Vec<Protocolist>>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let protocolists =
    desk.store().list_protocolists().await.map_err(ApiError::store)?;
  Ok(Json(protocolists))
}

/// `POST /protocolist-rents`
pub async fn create<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Json(body): Json<NewProtocolist>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  check_protocolist(&body)?;
  let protocolist =
    desk.store().add_protocolist(body).await.map_err(ApiError::store)??;
  tracing::info!(protocolist_id = protocolist.id, "protocolist added");
  Ok((StatusCode::CREATED, Json(protocolist)))
}

/// `GET /protocolist-rents/:id`
pub async fn get_one<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<ProtocolistId>,
) -> Result<Json<Protocolist>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  desk
    .store()
    .get_protocolist(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| not_found(id))
}

/// `PUT /protocolist-rents/:id` — full replacement.
pub async fn update<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<ProtocolistId>,
  Json(body): Json<NewProtocolist>,
) -> Result<Json<Updated>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  check_protocolist(&body)?;
  match desk
    .store()
    .update_protocolist(id, body)
    .await
    .map_err(ApiError::store)??
  {
    0 => Err(not_found(id)),
    updated_rows => Ok(Json(Updated { updated_rows })),
  }
}

/// `DELETE /protocolist-rents/:id` — cases keep their dangling reference.
pub async fn delete<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<ProtocolistId>,
) -> Result<Json<Deleted>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  match desk.store().delete_protocolist(id).await.map_err(ApiError::store)? {
    0 => Err(not_found(id)),
    deleted_rows => Ok(Json(Deleted { deleted_rows })),
  }
}

/// `GET /protocolist-rents/:id/escrituras`
pub async fn escrituras<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<ProtocolistId>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let escrituras =
    desk.store().escrituras_for(id).await.map_err(ApiError::store)?;
  Ok(Json(escrituras))
}
