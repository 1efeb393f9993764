//! Recipient deduplication and concurrent batch sending.

use std::collections::BTreeSet;

use alert_front_notify::{AlertMessage, NotificationSender, NotifyError};
use futures::future::join_all;

/// Outcome of one mass-alert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Reports found inside the alert area.
    pub candidates: usize,
    /// Distinct recipients among those reports.
    pub recipients: usize,
    /// Sends the provider accepted.
    pub delivered: usize,
    /// Sends that failed.
    pub failed: usize,
    /// Sends dropped because notifications are disabled.
    pub skipped: usize,
}

/// Collects contact identifiers into a set.
///
/// Identifiers are trimmed; blank ones are dropped.
pub fn dedupe_recipients<'a, I>(contacts: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    contacts
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sends `message` to every recipient concurrently and waits for all sends
/// to settle.
///
/// Each send is independent: a failure is logged and counted, is not
/// retried, and does not cancel the others. Refusals from a disabled sender
/// are counted as `skipped` rather than `failed`. `candidates` in the
/// returned summary is left at zero for the caller to fill in.
pub async fn dispatch(
    sender: &dyn NotificationSender,
    recipients: &BTreeSet<String>,
    message: &AlertMessage,
) -> DispatchSummary {
    let outcomes = join_all(recipients.iter().map(|recipient| async move {
        let result = sender.send(recipient, message).await;
        (recipient, result)
    }))
    .await;

    let mut summary = DispatchSummary {
        recipients: recipients.len(),
        ..DispatchSummary::default()
    };

    for (recipient, result) in outcomes {
        match result {
            Ok(receipt) => {
                log::debug!(
                    "Alert to {recipient} accepted as {} ({})",
                    receipt.message_id,
                    receipt.status
                );
                summary.delivered += 1;
            }
            Err(NotifyError::Disabled) => {
                log::debug!("Alert to {recipient} skipped: notifications are disabled");
                summary.skipped += 1;
            }
            Err(e) => {
                log::warn!("Alert to {recipient} failed: {e}");
                summary.failed += 1;
            }
        }
    }

    summary
}
