//! In-memory adapters for challenge tracking tests.

mod notifier;
mod repository;

pub use notifier::{RecordingNotifier, SentNotification};
pub use repository::InMemoryChallengeRepository;
