//! Error types for `notaria-core`.

use thiserror::Error;

use crate::{case::CaseId, validate::Rejection};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Rejected(#[from] Rejection),

  /// Covers both "no such case" and "case is not in the required status".
  #[error("case {0} not found")]
  CaseNotFound(CaseId),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box any backend error as a storage failure.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
