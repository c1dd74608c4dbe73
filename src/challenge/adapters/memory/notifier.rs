//! Recording notifier for tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::challenge::ports::{InvitationNotifier, NotifierError};

/// A delivered notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// Recipient address.
    pub recipient: String,
    /// Message subject.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// Notifier that records deliveries instead of sending them.
///
/// Construct with [`RecordingNotifier::failing`] to simulate an outbound
/// delivery failure.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Creates a notifier that records every delivery.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier whose deliveries always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    /// Returns the notifications recorded so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InvitationNotifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifierError> {
        if self.fail {
            return Err(NotifierError::delivery(std::io::Error::other(
                "simulated delivery failure",
            )));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|err| NotifierError::delivery(std::io::Error::other(err.to_string())))?;
        sent.push(SentNotification {
            recipient: recipient.to_owned(),
            subject: subject.to_owned(),
            body: body.to_owned(),
        });
        Ok(())
    }
}
