//! Verification email dispatch through Resend.
//!
//! Sending never fails the caller: every error is logged and folded into an
//! [`EmailOutcome`] with `success: false`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EmailSettings;
use crate::error::{AppError, AppResult};

const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A rendered message ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Failure reported by an email transport.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email provider is not configured")]
    NotConfigured,

    #[error("Email provider rejected the message (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Email transport error: {0}")]
    Transport(String),
}

/// Outbound email provider.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Hand the message to the provider and return its message id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError>;
}

/// Structured result of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Resend REST transport (`POST /emails`).
pub struct ResendTransport {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl ResendTransport {
    pub fn new(settings: &EmailSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct ResendSendBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendSendResponse {
    id: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        let api_key = self.api_key.as_ref().ok_or(EmailError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&ResendSendBody {
                from: &email.from,
                to: [&email.to],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        let body: ResendSendResponse = response
            .json()
            .await
            .map_err(|e| EmailError::Transport(format!("Unreadable provider response: {}", e)))?;

        if !status.is_success() {
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message: body.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(body.id.unwrap_or_default())
    }
}

/// Renders verification emails and hands them to a transport.
#[derive(Clone)]
pub struct EmailDispatcher {
    transport: Arc<dyn EmailTransport>,
    from: String,
    app_url: String,
}

impl EmailDispatcher {
    pub fn new(transport: Arc<dyn EmailTransport>, from: &str, app_url: &str) -> Self {
        Self {
            transport,
            from: from.to_string(),
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }

    /// Link the user clicks to redeem `token`.
    pub fn verification_url(&self, token: &str) -> String {
        format!(
            "{}/verify-email?token={}",
            self.app_url,
            urlencoding::encode(token)
        )
    }

    /// Send the verification email. Never returns an error.
    pub async fn send_verification_email(&self, email: &str, token: &str, name: &str) -> EmailOutcome {
        let message = OutgoingEmail {
            from: self.from.clone(),
            to: email.to_string(),
            subject: "Verify your email for Sketchy".to_string(),
            html: render_verification_html(name, &self.verification_url(token)),
        };

        match self.transport.send(&message).await {
            Ok(id) => {
                info!(to = %email, message_id = %id, "Verification email sent");
                EmailOutcome {
                    success: true,
                    id: Some(id),
                    error: None,
                }
            }
            Err(e) => {
                warn!(to = %email, error = %e, "Error sending verification email");
                EmailOutcome {
                    success: false,
                    id: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn render_verification_html(name: &str, verification_url: &str) -> String {
    let name = escape_html(name);
    format!(
        r#"<div style="font-family: sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Welcome to Sketchy!</h2>
  <p>Hi {name},</p>
  <p>Please verify your email address to get started by clicking the button below:</p>
  <a href="{url}" style="display: inline-block; background-color: #00d2be; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; font-weight: bold; margin: 16px 0;">
    Verify Email
  </a>
  <p>Or copy and paste this link into your browser:</p>
  <p><a href="{url}" style="color: #00d2be;">{url}</a></p>
  <p>This link will expire in 24 hours.</p>
  <p>Best regards,<br>The Sketchy Team</p>
</div>"#,
        name = name,
        url = verification_url,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
