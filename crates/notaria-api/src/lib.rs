//! JSON REST API for the notary office.
//!
//! Exposes an axum [`Router`] backed by a [`CaseDesk`] over any
//! [`OfficeStore`] and [`MailTransport`]. Auth, TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = notaria_api::api_router(desk);
//! axum::serve(listener, app).await?;
//! ```

pub mod cases;
pub mod email;
pub mod error;
pub mod extract;
pub mod invoices;
pub mod protocolists;


use axum::{
  Router,
  routing::{get, post},
};
use notaria_core::{
  lifecycle::CaseDesk, notify::MailTransport, store::OfficeStore,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build a fully-materialised API router around `desk`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(desk: CaseDesk<S, M>) -> Router<()>
where
  S: OfficeStore + 'static,
  M: MailTransport + 'static,
{
  Router::new()
    // Cases
    .route("/case-rents", get(cases::list::<S, M>).post(cases::create::<S, M>))
    .route(
      "/case-rents/{id}",
      get(cases::get_one::<S, M>)
        .put(cases::update::<S, M>)
        .delete(cases::delete::<S, M>),
    )
    .route("/case-rents/{id}/finish", post(cases::finish::<S, M>))
    .route("/case-rents-finished", get(cases::list_finished::<S, M>))
    // Protocolists
    .route(
      "/protocolist-rents",
      get(protocolists::list::<S, M>).post(protocolists::create::<S, M>),
    )
    .route(
      "/protocolist-rents/{id}",
      get(protocolists::get_one::<S, M>)
        .put(protocolists::update::<S, M>)
        .delete(protocolists::delete::<S, M>),
    )
    .route(
      "/protocolist-rents/{id}/escrituras",
      get(protocolists::escrituras::<S, M>),
    )
    // Invoices
    .route("/facturas", get(invoices::list::<S, M>).post(invoices::create::<S, M>))
    .route(
      "/facturas/{id}",
      get(invoices::get_one::<S, M>)
        .put(invoices::update::<S, M>)
        .delete(invoices::delete::<S, M>),
    )
    // Mail
    .route("/send-email", post(email::send::<S, M>))
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
    .with_state(desk)
}

async fn health() -> &'static str { "ok" }
