//! Core types and trait definitions for the notary case-management service.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::OfficeStore`], mail backends implement
//! [`notify::MailTransport`], and [`lifecycle::CaseDesk`] composes the two into
//! the validate / persist / finish flow for case records.
//!
//! Trait methods return `impl Future<Output = …> + Send` so implementors can
//! write plain `async fn` while callers keep the `Send` bound axum needs.

pub mod case;
pub mod error;
pub mod invoice;
pub mod lifecycle;
pub mod notify;
pub mod protocolist;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
pub use validate::{Checked, Rejection};
