//! Handlers for `/facturas` endpoints. Plain CRUD with field checks.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use notaria_core::{
  invoice::{Invoice, InvoiceId, NewInvoice},
  lifecycle::CaseDesk,
  notify::MailTransport,
  store::OfficeStore,
  validate::check_invoice,
};

use crate::{
  cases::{Deleted, Updated},
  error::ApiError,
  extract::{Json, Path},
};

fn not_found(id: InvoiceId) -> ApiError {
  ApiError::NotFound(format!("invoice {id} not found"))
}

/// `GET /facturas`
pub async fn list<S, M>(
  State(desk): State<CaseDesk<S, M>>,
) -> Result<Json<Vec<Invoice>>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let invoices = desk.store().list_invoices().await.map_err(ApiError::store)?;
  Ok(Json(invoices))
}

/// `POST /facturas`
pub async fn create<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Json(body): Json<NewInvoice>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  check_invoice(&body)?;
  let invoice = desk.store().add_invoice(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(invoice)))
}

/// `GET /facturas/:id`
pub async fn get_one<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  desk
    .store()
    .get_invoice(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| not_found(id))
}

/// `PUT /facturas/:id`
pub async fn update<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<InvoiceId>,
  Json(body): Json<NewInvoice>,
) -> Result<Json<Updated>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  check_invoice(&body)?;
  match desk.store().update_invoice(id, body).await.map_err(ApiError::store)? {
    0 => Err(not_found(id)),
    updated_rows => Ok(Json(Updated { updated_rows })),
  }
}

/// `DELETE /facturas/:id`
pub async fn delete<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Path(id): Path<InvoiceId>,
) -> Result<Json<Deleted>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  match desk.store().delete_invoice(id).await.map_err(ApiError::store)? {
    0 => Err(not_found(id)),
    deleted_rows => Ok(Json(Deleted { deleted_rows })),
  }
}
