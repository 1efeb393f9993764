//! Twilio SMS sender.
//!
//! Posts to the Messages resource of the Twilio REST API:
//! `POST {base}/2010-04-01/Accounts/{sid}/Messages.json` with form fields
//! `To`, `From` and `Body`, authenticated with the account SID and auth
//! token as HTTP basic credentials.
//!
//! See <https://www.twilio.com/docs/messaging/api/message-resource>

use std::time::Duration;

use serde::Deserialize;

use crate::{AlertMessage, DEFAULT_TIMEOUT, DeliveryReceipt, NotificationSender, NotifyError};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Environment variables that must all be set for Twilio to be used.
pub const REQUIRED_VARS: &[&str] = &[
    "TWILIO_ACCOUNT_SID",
    "TWILIO_AUTH_TOKEN",
    "TWILIO_PHONE_NUMBER",
];

/// Credentials and endpoint for the Twilio API.
#[derive(Clone)]
pub struct TwilioConfig {
    /// Account SID (`AC...`).
    pub account_sid: String,
    /// Auth token.
    pub auth_token: String,
    /// Sending phone number in E.164 form.
    pub from_number: String,
    /// API host, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TwilioConfig {
    /// Reads the configuration from `TWILIO_*` environment variables.
    ///
    /// `TWILIO_BASE_URL` and `NOTIFY_TIMEOUT_SECS` are optional.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] naming the first missing credential.
    pub fn from_env() -> Result<Self, NotifyError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| NotifyError::Config {
                    message: format!("{name} environment variable not set"),
                })
        };

        let timeout = std::env::var("NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            account_sid: var("TWILIO_ACCOUNT_SID")?,
            auth_token: var("TWILIO_AUTH_TOKEN")?,
            from_number: var("TWILIO_PHONE_NUMBER")?,
            base_url: std::env::var("TWILIO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
        })
    }

    /// URL of the Messages resource for this account.
    #[must_use]
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

/// Sends alerts as SMS via Twilio.
pub struct TwilioSender {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioSender {
    /// Creates a sender with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(config: TwilioConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

/// Successful Messages API response (subset).
#[derive(Deserialize)]
struct TwilioMessage {
    sid: String,
    status: String,
}

/// Messages API error response (subset).
#[derive(Deserialize)]
struct TwilioError {
    message: String,
}

#[async_trait::async_trait]
impl NotificationSender for TwilioSender {
    async fn send(
        &self,
        recipient: &str,
        message: &AlertMessage,
    ) -> Result<DeliveryReceipt, NotifyError> {
        let body = message.body();
        let resp = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", recipient),
                ("From", self.config.from_number.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        parse_response(recipient, status, &text)
    }
}

/// Interprets a Messages API response.
fn parse_response(
    recipient: &str,
    status: u16,
    body: &str,
) -> Result<DeliveryReceipt, NotifyError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<TwilioError>(body)
            .map_or_else(|_| body.chars().take(200).collect(), |e| e.message);
        return Err(NotifyError::Provider { status, message });
    }

    let parsed: TwilioMessage =
        serde_json::from_str(body).map_err(|e| NotifyError::Provider {
            status,
            message: format!("Unexpected Twilio response: {e}"),
        })?;

    Ok(DeliveryReceipt {
        recipient: recipient.to_string(),
        message_id: parsed.sid,
        status: parsed.status,
    })
}
