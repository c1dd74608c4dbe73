//! Port contracts for challenge tracking.
//!
//! Ports define infrastructure-agnostic interfaces used by challenge
//! services.

pub mod notifier;
pub mod repository;

pub use notifier::{InvitationNotifier, NotifierError};
pub use repository::{ChallengeRepository, ChallengeRepositoryError, ChallengeRepositoryResult};
