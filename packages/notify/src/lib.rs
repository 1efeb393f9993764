#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Notification sending for mass alerts.
//!
//! [`NotificationSender`] is the seam between the dispatcher and the
//! messaging provider. [`TwilioSender`](twilio::TwilioSender) delivers SMS
//! through the Twilio Messages API; [`DisabledSender`](disabled::DisabledSender)
//! is the explicit "no provider configured" variant. Senders are built once
//! at startup by [`create_sender_from_env`] and injected into the
//! dispatcher.

pub mod disabled;
pub mod twilio;

use std::sync::Arc;
use std::time::Duration;

use alert_front_report_models::{Report, Urgency};
use thiserror::Error;

/// Longest message body sent, in characters (two SMS segments).
pub const MAX_BODY_CHARS: usize = 320;

/// Default per-request timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from notification sending.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the message.
    #[error("Provider error ({status}): {message}")]
    Provider {
        /// HTTP status code returned.
        status: u16,
        /// Provider-supplied reason.
        message: String,
    },

    /// Sender could not be configured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },

    /// Notifications are turned off.
    #[error("Notifications are disabled")]
    Disabled,
}

/// Proof that the provider accepted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Recipient the message was sent to.
    pub recipient: String,
    /// Provider-assigned message id.
    pub message_id: String,
    /// Provider-reported status (e.g. `queued`).
    pub status: String,
}

/// Mass-alert payload derived from the triggering report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    /// Hazard description.
    pub description: String,
    /// Hazard urgency.
    pub urgency: Urgency,
}

impl AlertMessage {
    /// Builds the alert for a newly filed report.
    #[must_use]
    pub fn from_report(report: &Report) -> Self {
        Self {
            description: report.description.clone(),
            urgency: report.urgency,
        }
    }

    /// Renders the SMS text, truncated to [`MAX_BODY_CHARS`] characters.
    #[must_use]
    pub fn body(&self) -> String {
        let body = format!(
            "AlertFront: {} urgency hazard reported near you: {}",
            self.urgency, self.description
        );

        if body.chars().count() <= MAX_BODY_CHARS {
            return body;
        }

        let mut truncated: String = body.chars().take(MAX_BODY_CHARS - 3).collect();
        truncated.push_str("...");
        truncated
    }
}

/// Delivers one alert to one recipient.
#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends `message` to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the message could not be handed to the
    /// provider.
    async fn send(
        &self,
        recipient: &str,
        message: &AlertMessage,
    ) -> Result<DeliveryReceipt, NotifyError>;
}

/// Creates a notification sender based on environment variables.
///
/// If `NOTIFIER` is set it selects the sender explicitly (`twilio` or
/// `disabled`). Otherwise a Twilio sender is built when
/// `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and `TWILIO_PHONE_NUMBER` are
/// all present, and notifications are disabled with a warning when they
/// are not.
///
/// # Errors
///
/// Returns [`NotifyError::Config`] if Twilio is requested explicitly but a
/// credential is missing, or `NOTIFIER` names an unknown sender.
pub fn create_sender_from_env() -> Result<Arc<dyn NotificationSender>, NotifyError> {
    let notifier = std::env::var("NOTIFIER").unwrap_or_else(|_| detect_sender());

    match notifier.to_lowercase().as_str() {
        "twilio" | "sms" => {
            let config = twilio::TwilioConfig::from_env()?;
            log::info!("Notifications via Twilio from {}", config.from_number);
            Ok(Arc::new(twilio::TwilioSender::new(config)?))
        }
        "disabled" | "none" | "off" => {
            log::info!("Notifications disabled");
            Ok(Arc::new(disabled::DisabledSender))
        }
        other => Err(NotifyError::Config {
            message: format!("Unknown notifier: {other}. Use 'twilio' or 'disabled'."),
        }),
    }
}

fn detect_sender() -> String {
    let has_twilio = twilio::REQUIRED_VARS
        .iter()
        .all(|var| std::env::var(var).is_ok_and(|v| !v.is_empty()));

    if has_twilio {
        log::info!("Auto-detected notifier: Twilio (credentials found)");
        return "twilio".to_string();
    }

    log::warn!(
        "No Twilio credentials detected; mass alerts will not be delivered. Set \
         TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_PHONE_NUMBER, or set \
         NOTIFIER=disabled to silence this warning."
    );
    "disabled".to_string()
}
