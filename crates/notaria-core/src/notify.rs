//! The mail transport seam and the notices a status transition reports.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{case::CaseRecord, protocolist::Protocolist};

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

impl MailMessage {
  /// The notice sent to a protocolist when one of their cases is finished.
  pub fn case_finished(case: &CaseRecord, protocolist: &Protocolist) -> Self {
    Self {
      to:      protocolist.email.clone(),
      subject: format!("Case {} finished", case.radicado),
      body:    format!(
        "Hello {},\n\n\
         The case with radicado {} (escritura {}, dated {}) has been marked \
         as finished.\n",
        protocolist.full_name(),
        case.radicado,
        case.escritura,
        case.document_date,
      ),
    }
  }
}

/// Abstraction over an outbound mail service.
///
/// Returns `Send` futures so implementations can be shared across axum
/// handlers.
pub trait MailTransport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send(
    &self,
    message: MailMessage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// What happened to the notification attached to a status transition.
///
/// A failure here never undoes the transition itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Notice {
  /// Notifications are turned off.
  Disabled,
  /// Nothing could be sent, e.g. the protocolist no longer exists.
  Skipped { reason: String },
  Sent { to: String },
  /// The transport (or the recipient lookup) failed.
  Failed { reason: String },
}

impl Notice {
  /// The non-fatal warning to surface to the caller, if any.
  pub fn warning(&self) -> Option<String> {
    match self {
      Self::Failed { reason } => Some(format!(
        "the case was finished but the notification failed: {reason}"
      )),
      _ => None,
    }
  }
}
