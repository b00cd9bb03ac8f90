use std::collections::BTreeMap;

use async_trait::async_trait;
use orgdesk_config::SmtpSettings;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use validator::ValidateEmail;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("SMTP not configured, check your server configuration")]
    SmtpNotEnabled,
    #[error("Mail transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    /// Link to sign up through an invite.
    NewUserInvite,
    /// Notice that an existing account was added to an org.
    InvitedToOrg,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendEmail {
    pub to: Vec<String>,
    pub template: EmailTemplate,
    pub data: BTreeMap<String, String>,
}

pub fn is_email(candidate: &str) -> bool {
    candidate.validate_email()
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: SendEmail) -> Result<(), NotificationError>;
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from_address: &'a str,
    from_name: &'a str,
    #[serde(flatten)]
    email: &'a SendEmail,
}

/// Hands rendered-by-template mail to an HTTP relay that owns the SMTP connection.
pub struct RelayMailer {
    client: reqwest::Client,
    settings: SmtpSettings,
}

impl RelayMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, email: SendEmail) -> Result<(), NotificationError> {
        if !self.settings.enabled {
            return Err(NotificationError::SmtpNotEnabled);
        }

        self.client
            .post(&self.settings.relay_url)
            .json(&RelayRequest {
                from_address: &self.settings.from_address,
                from_name: &self.settings.from_name,
                email: &email,
            })
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        info!(template = ?email.template, recipients = email.to.len(), "Email relayed");
        Ok(())
    }
}
