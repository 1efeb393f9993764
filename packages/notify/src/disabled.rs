//! Sender used when no messaging provider is configured.

use crate::{AlertMessage, DeliveryReceipt, NotificationSender, NotifyError};

/// Refuses every send with [`NotifyError::Disabled`].
///
/// Keeps the dispatch pipeline intact (nearby lookup, deduplication,
/// logging) when no provider credentials are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSender;

#[async_trait::async_trait]
impl NotificationSender for DisabledSender {
    async fn send(
        &self,
        recipient: &str,
        _message: &AlertMessage,
    ) -> Result<DeliveryReceipt, NotifyError> {
        log::debug!("Notifications disabled; not alerting {recipient}");
        Err(NotifyError::Disabled)
    }
}
