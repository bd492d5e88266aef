//! Delivery through an SMTP relay.

use lettre::{
  AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use notaria_core::notify::{MailMessage, MailTransport};

use crate::{Error, MailConfig, Result};

/// Sends mail through the relay named in [`MailConfig`], over TLS.
#[derive(Clone)]
pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpMailer {
  pub fn new(config: &MailConfig) -> Result<Self> {
    let from = parse_mailbox(&config.from)?;
    let mut builder =
      AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?.port(config.port);
    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
      builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    Ok(Self { transport: builder.build(), from })
  }

  fn build(&self, message: MailMessage) -> Result<Message> {
    Ok(
      Message::builder()
        .from(self.from.clone())
        .to(parse_mailbox(&message.to)?)
        .subject(message.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(message.body)?,
    )
  }
}

pub(crate) fn parse_mailbox(address: &str) -> Result<Mailbox> {
  address.parse().map_err(|source| Error::Address { address: address.to_owned(), source })
}

impl MailTransport for SmtpMailer {
  type Error = Error;

  async fn send(&self, message: MailMessage) -> Result<()> {
    let to = message.to.clone();
    let email = self.build(message)?;
    self.transport.send(email).await?;
    tracing::info!(%to, "mail sent");
    Ok(())
  }
}
