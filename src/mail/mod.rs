//! Report email dispatch over SMTP
//!
//! Credentials are checked before any connection is attempted, so a missing
//! sender or password fails fast and offline.

use crate::utils::toml_config::{EmailConfig, EmailCredentials};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;

pub const EMAIL_BODY: &str = "Please find the attached stock analysis report.";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("missing email credential: {0} is not set")]
    MissingCredential(String),

    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("cannot read attachment {path:?}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// One report to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRequest {
    pub recipient: String,
    pub company: String,
    pub document: PathBuf,
}

impl EmailRequest {
    pub fn subject(&self) -> String {
        format!("Stock Analysis Report: {}", self.company)
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_report(&self, request: &EmailRequest) -> Result<(), MailError>;
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Build the multipart message: plain-text body plus the document attachment
pub fn compose(sender: &str, request: &EmailRequest, document: Vec<u8>) -> Result<Message, MailError> {
    let filename = request
        .document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stock_report.pdf".to_string());

    let content_type =
        ContentType::parse("application/pdf").map_err(|e| MailError::Build(e.to_string()))?;

    Message::builder()
        .from(mailbox(sender)?)
        .to(mailbox(&request.recipient)?)
        .subject(request.subject())
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(EMAIL_BODY.to_string()))
                .singlepart(Attachment::new(filename).body(document, content_type)),
        )
        .map_err(|e| MailError::Build(e.to_string()))
}

/// Sends reports over implicit-TLS SMTP
pub struct ReportMailer {
    config: EmailConfig,
    credentials: EmailCredentials,
}

impl ReportMailer {
    pub fn new(config: EmailConfig, credentials: EmailCredentials) -> Self {
        Self {
            config,
            credentials,
        }
    }

    fn credentials(&self) -> Result<(&str, &str), MailError> {
        let sender = self
            .credentials
            .sender
            .as_deref()
            .ok_or_else(|| MailError::MissingCredential(self.config.sender_env.clone()))?;
        let password = self
            .credentials
            .password
            .as_deref()
            .ok_or_else(|| MailError::MissingCredential(self.config.password_env.clone()))?;
        Ok((sender, password))
    }
}

#[async_trait]
impl Mailer for ReportMailer {
    async fn send_report(&self, request: &EmailRequest) -> Result<(), MailError> {
        let (sender, password) = self.credentials()?;

        let document = tokio::fs::read(&request.document)
            .await
            .map_err(|source| MailError::Attachment {
                path: request.document.clone(),
                source,
            })?;

        let message = compose(sender, request, document)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!(recipient = %request.recipient, company = %request.company, "report emailed");
        Ok(())
    }
}
