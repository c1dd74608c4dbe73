//! Notifier port for outbound invitation delivery.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Best-effort outbound notification contract.
///
/// Delivery runs outside the repository transaction that records the
/// invitation; a failure here never rolls the invitation back.
#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    /// Delivers a notification to the given recipient address.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when delivery fails.
    async fn notify(&self, recipient: &str, subject: &str, body: &str)
    -> Result<(), NotifierError>;
}

/// Error returned by notifier implementations.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifierError(Arc<dyn std::error::Error + Send + Sync>);

impl NotifierError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
