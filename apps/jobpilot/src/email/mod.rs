//! Outbound email. Resend and SendGrid are HTTP APIs; the outbox provider
//! writes messages to disk and is the default when no provider key exists.

pub mod digest;

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::storage::kits::slug;

const RESEND_API_URL: &str = "https://api.resend.com";
const SENDGRID_API_URL: &str = "https://api.sendgrid.com";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Recipient address is missing")]
    MissingRecipient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum MailProvider {
    Resend { api_key: String, base_url: String },
    SendGrid { api_key: String, base_url: String },
    Outbox { dir: PathBuf },
}

impl MailProvider {
    pub fn name(&self) -> &'static str {
        match self {
            MailProvider::Resend { .. } => "resend",
            MailProvider::SendGrid { .. } => "sendgrid",
            MailProvider::Outbox { .. } => "outbox",
        }
    }
}

/// Where a message ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    Sent { id: Option<String> },
    Written { path: PathBuf },
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    provider: MailProvider,
    from: String,
}

impl Mailer {
    pub fn new(provider: MailProvider, from: impl Into<String>) -> Result<Self, EmailError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            provider,
            from: from.into(),
        })
    }

    /// `EMAIL_PROVIDER` wins when its key is present; otherwise the first
    /// provider with a key; otherwise the outbox under `OUTPUT_DIR/outbox`.
    pub fn from_config(config: &Config) -> Result<Self, EmailError> {
        let resend = config.resend_api_key.clone().map(|api_key| MailProvider::Resend {
            api_key,
            base_url: RESEND_API_URL.to_string(),
        });
        let sendgrid = config.sendgrid_api_key.clone().map(|api_key| MailProvider::SendGrid {
            api_key,
            base_url: SENDGRID_API_URL.to_string(),
        });
        let outbox = MailProvider::Outbox {
            dir: config.output_dir.join("outbox"),
        };

        let provider = match config.email_provider.as_deref() {
            Some("outbox") => outbox,
            Some("resend") => resend.unwrap_or_else(|| {
                warn!("EMAIL_PROVIDER=resend but RESEND_API_KEY is not set; using outbox");
                outbox
            }),
            Some("sendgrid") => sendgrid.unwrap_or_else(|| {
                warn!("EMAIL_PROVIDER=sendgrid but SENDGRID_API_KEY is not set; using outbox");
                outbox
            }),
            _ => resend.or(sendgrid).unwrap_or(outbox),
        };
        info!("Email provider: {}", provider.name());
        Self::new(provider, config.email_from.clone())
    }

    pub fn provider(&self) -> &MailProvider {
        &self.provider
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<Delivery, EmailError> {
        if message.to.trim().is_empty() {
            return Err(EmailError::MissingRecipient);
        }

        match &self.provider {
            MailProvider::Resend { api_key, base_url } => {
                let response = self
                    .client
                    .post(format!("{base_url}/emails"))
                    .bearer_auth(api_key)
                    .json(&json!({
                        "from": self.from,
                        "to": [message.to],
                        "subject": message.subject,
                        "html": message.html,
                        "text": message.text,
                    }))
                    .send()
                    .await?;
                let response = check("resend", response).await?;
                let id = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v["id"].as_str().map(str::to_string));
                Ok(Delivery::Sent { id })
            }
            MailProvider::SendGrid { api_key, base_url } => {
                let response = self
                    .client
                    .post(format!("{base_url}/v3/mail/send"))
                    .bearer_auth(api_key)
                    .json(&json!({
                        "personalizations": [{"to": [{"email": message.to}]}],
                        "from": {"email": self.from},
                        "subject": message.subject,
                        "content": [
                            {"type": "text/plain", "value": message.text},
                            {"type": "text/html", "value": message.html},
                        ],
                    }))
                    .send()
                    .await?;
                let response = check("sendgrid", response).await?;
                let id = response
                    .headers()
                    .get("x-message-id")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(Delivery::Sent { id })
            }
            MailProvider::Outbox { dir } => {
                let io_err = |path: &PathBuf, source| EmailError::Io {
                    path: path.clone(),
                    source,
                };
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
                let path = dir.join(format!(
                    "{}_{}.html",
                    Utc::now().format("%Y%m%dT%H%M%S%.3f"),
                    slug(&message.to)
                ));
                std::fs::write(&path, &message.html).map_err(|e| io_err(&path, e))?;
                info!("Wrote email for {} to {}", message.to, path.display());
                Ok(Delivery::Written { path })
            }
        }
    }
}

async fn check(provider: &'static str, response: reqwest::Response) -> Result<reqwest::Response, EmailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(EmailError::Api {
        provider,
        status: status.as_u16(),
        message: response.text().await.unwrap_or_default(),
    })
}
