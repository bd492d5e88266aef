//! `POST /send-email` — ad-hoc mail through the configured transport.

use axum::extract::State;
use notaria_core::{
  lifecycle::CaseDesk,
  notify::{MailMessage, MailTransport},
  store::OfficeStore,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extract::Json};

const DEFAULT_SUBJECT: &str = "Case notification";
const DEFAULT_TEXT: &str = "No message content.";

#[derive(Debug, Deserialize)]
pub struct SendBody {
  #[serde(default)]
  pub to:      String,
  pub subject: Option<String>,
  pub text:    Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Sent {
  pub sent: bool,
  pub to:   String,
}

pub async fn send<S, M>(
  State(desk): State<CaseDesk<S, M>>,
  Json(body): Json<SendBody>,
) -> Result<Json<Sent>, ApiError>
where
  S: OfficeStore,
  M: MailTransport,
{
  let to = body.to.trim().to_owned();
  if !to.contains('@') {
    return Err(ApiError::BadRequest(format!(
      "{to:?} is not a valid recipient address"
    )));
  }

  let message = MailMessage {
    to:      to.clone(),
    subject: body.subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_owned()),
    body:    body.text.unwrap_or_else(|| DEFAULT_TEXT.to_owned()),
  };
  desk.mailer().send(message).await.map_err(|e| {
    tracing::warn!(%to, error = %e, "email failed");
    ApiError::Mail(Box::new(e))
  })?;

  Ok(Json(Sent { sent: true, to }))
}
