//! SMTP notifier via `lettre`: STARTTLS submission with credentials.

use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use slotwatch_core::{MailConfig, SlotCandidate, Target};

use crate::error::NotifyError;
use crate::notifier::Notifier;
use crate::template::MessageTemplate;

/// Sends one plain-text e-mail per discovered slot.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    subject: String,
    template: MessageTemplate,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl EmailNotifier {
    /// Builds the notifier from the mail section of the app config.
    ///
    /// Loads the template from `config.template_path` when set, otherwise
    /// uses the built-in template.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] if an address does not parse, the
    /// relay cannot be configured, or the template file cannot be read, and
    /// [`NotifyError::Template`] if the template does not parse.
    pub fn from_config(config: &MailConfig) -> Result<Self, NotifyError> {
        let template = match &config.template_path {
            Some(path) => MessageTemplate::from_file(path)?,
            None => MessageTemplate::default(),
        };
        Self::new(config, template)
    }

    /// Builds the notifier with an explicit template.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] if an address does not parse or the
    /// relay cannot be configured.
    pub fn new(config: &MailConfig, template: MessageTemplate) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                NotifyError::Config(format!("invalid sender \"{}\": {e}", config.from))
            })?;
        let to: Mailbox = config
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                NotifyError::Config(format!("invalid recipient \"{}\": {e}", config.to))
            })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| NotifyError::Config(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            subject: config.subject.clone(),
            template,
        })
    }

    fn build_message(&self, target: &Target, slot: &SlotCandidate) -> Result<Message, NotifyError> {
        let body = self.template.render(target, slot)?;
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&self.subject)
            .body(body)
            .map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, target: &Target, slots: &[SlotCandidate]) -> Result<(), NotifyError> {
        for slot in slots {
            let email = self.build_message(target, slot)?;
            self.transport
                .send(email)
                .await
                .map_err(|e| NotifyError::Smtp(e.to_string()))?;

            tracing::info!(
                channel = "email",
                location_id = target.location_id,
                service_id = target.service_id,
                date = %slot.display_date(),
                "notification delivered"
            );
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
