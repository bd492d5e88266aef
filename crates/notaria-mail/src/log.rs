//! A transport that only logs. Used in development and when no relay is
//! configured.

use notaria_core::notify::{MailMessage, MailTransport};

use crate::{Result, smtp::parse_mailbox};

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl MailTransport for LogMailer {
  type Error = crate::Error;

  async fn send(&self, message: MailMessage) -> Result<()> {
    // Same address check as the SMTP path.
    parse_mailbox(&message.to)?;
    tracing::info!(
      to = %message.to,
      subject = %message.subject,
      body = %message.body,
      "mail not sent (log transport)"
    );
    Ok(())
  }
}
