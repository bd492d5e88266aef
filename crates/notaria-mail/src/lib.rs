//! Outbound mail for the notary service.
//!
//! [`Mailer`] is the [`MailTransport`] the server wires into the case desk and
//! the `/send-email` endpoint. It delivers through SMTP ([`SmtpMailer`]) or,
//! when no relay is configured, only logs ([`LogMailer`]).

pub mod error;
pub mod log;
pub mod smtp;

pub use error::{Error, Result};
pub use log::LogMailer;
use notaria_core::notify::{MailMessage, MailTransport};
use serde::Deserialize;
pub use smtp::SmtpMailer;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
  Smtp,
  #[default]
  Log,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
  pub transport: TransportKind,
  pub host:      String,
  pub port:      u16,
  pub username:  Option<String>,
  pub password:  Option<String>,
  /// Sender address, e.g. `Notaría <avisos@notaria.co>`.
  pub from:      String,
}

impl Default for MailConfig {
  fn default() -> Self {
    Self {
      transport: TransportKind::Log,
      host:      "localhost".to_owned(),
      port:      465,
      username:  None,
      password:  None,
      from:      "notaria@localhost".to_owned(),
    }
  }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

pub enum Mailer {
  Smtp(SmtpMailer),
  Log(LogMailer),
}

impl Mailer {
  pub fn from_config(config: &MailConfig) -> Result<Self> {
    Ok(match config.transport {
      TransportKind::Smtp => Self::Smtp(SmtpMailer::new(config)?),
      TransportKind::Log => Self::Log(LogMailer),
    })
  }
}

impl MailTransport for Mailer {
  type Error = Error;

  async fn send(&self, message: MailMessage) -> Result<()> {
    match self {
      Self::Smtp(m) => m.send(message).await,
      Self::Log(m) => m.send(message).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn message(to: &str) -> MailMessage {
    MailMessage {
      to:      to.into(),
      subject: "Case R-001 finished".into(),
      body:    "hello".into(),
    }
  }

  #[test]
  fn default_config_logs_only() {
    let mailer = Mailer::from_config(&MailConfig::default()).unwrap();
    assert!(matches!(mailer, Mailer::Log(_)));
  }

  #[test]
  fn smtp_config_rejects_bad_sender() {
    let config = MailConfig {
      transport: TransportKind::Smtp,
      from: "not an address".into(),
      ..MailConfig::default()
    };
    assert!(matches!(Mailer::from_config(&config), Err(Error::Address { .. })));
  }

  #[tokio::test]
  async fn log_mailer_accepts_valid_recipient() {
    LogMailer.send(message("ana@notaria.co")).await.unwrap();
  }

  #[tokio::test]
  async fn log_mailer_rejects_malformed_recipient() {
    let err = LogMailer.send(message("ana")).await.unwrap_err();
    assert!(matches!(err, Error::Address { ref address, .. } if address == "ana"));
  }
}
