//! Outbound Mail Transport
//!
//! [`MailTransport`] is the seam the application talks to. Two transports
//! ship with the platform:
//! - [`HttpMailTransport`]: JSON transactional-mail API (Brevo-compatible
//!   `POST /v3/smtp/email` payload, `api-key` header)
//! - [`LogMailTransport`]: records recipient and subject in the log and
//!   delivers nothing, for local development
//!
//! [`Mailer`] picks one of them at startup.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroizing;

/// Request timeout for the HTTP transport
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport request failed: {0}")]
    Transport(String),

    #[error("Mail API rejected the message with status {status}")]
    Rejected { status: u16 },

    #[error("Failed to encode mail payload: {0}")]
    Encode(String),
}

/// Sends one message, best effort, surfacing failures to the caller.
#[trait_variant::make(MailTransport: Send)]
pub trait LocalMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

// ============================================================================
// HTTP transport
// ============================================================================

/// Connection settings for [`HttpMailTransport`]
pub struct HttpMailConfig {
    pub endpoint: String,
    pub api_key: Zeroizing<String>,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

impl fmt::Debug for HttpMailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMailConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: EmailAddress<'a>,
    to: [EmailAddress<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
}

pub struct HttpMailTransport {
    client: reqwest::Client,
    config: HttpMailConfig,
}

impl HttpMailTransport {
    pub fn new(config: HttpMailConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn payload(&self, message: &MailMessage) -> Result<String, MailError> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: &self.config.sender_email,
                name: self.config.sender_name.as_deref(),
            },
            to: [EmailAddress {
                email: &message.to,
                name: None,
            }],
            subject: &message.subject,
            html_content: &message.html_body,
        };

        serde_json::to_string(&body).map_err(|e| MailError::Encode(e.to_string()))
    }
}

impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let payload = self.payload(message)?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("api-key", self.config.api_key.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(status = status.as_u16(), "Mail accepted by transport");
        Ok(())
    }
}

// ============================================================================
// Logging transport
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailTransport;

impl MailTransport for LogMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Mail transport disabled, message not delivered"
        );
        Ok(())
    }
}

// ============================================================================
// Runtime selection
// ============================================================================

/// Transport chosen from configuration at startup
pub enum Mailer {
    Http(HttpMailTransport),
    Log(LogMailTransport),
}

impl MailTransport for Mailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        match self {
            Mailer::Http(transport) => MailTransport::send(transport, message).await,
            Mailer::Log(transport) => MailTransport::send(transport, message).await,
        }
    }
}
