//! Service-level error type shared by the challenge services.

use super::token::InvitationTokenError;
use crate::challenge::domain::{ChallengeDomainError, StateTransitionError};
use crate::challenge::ports::ChallengeRepositoryError;
use thiserror::Error;

/// Result type for challenge service operations.
pub type ChallengeServiceResult<T> = Result<T, ChallengeServiceError>;

/// Errors returned by the challenge services.
///
/// Variants group into the caller-facing taxonomy: validation failures are
/// rejected before any persistence attempt; `NotFound` deliberately carries
/// no payload so unauthorized reads are indistinguishable from missing
/// records; `Forbidden` implies the record's existence is already known to
/// the caller; the remaining named variants are conflicts with current
/// state; `Repository` is an opaque internal failure.
#[derive(Debug, Error)]
pub enum ChallengeServiceError {
    /// Input failed domain validation.
    #[error(transparent)]
    Validation(#[from] ChallengeDomainError),

    /// A lifecycle action was attempted from the wrong state.
    #[error(transparent)]
    Transition(#[from] StateTransitionError),

    /// The record is absent, or the caller may not know whether it exists.
    #[error("not found")]
    NotFound,

    /// The caller is a member but lacks the owner role.
    #[error("operation requires the challenge owner")]
    Forbidden,

    /// The user already holds a membership of the challenge.
    #[error("user is already a member of the challenge")]
    AlreadyMember,

    /// An invitation for the `(challenge, user)` pair already exists.
    #[error("user is already invited to the challenge")]
    AlreadyInvited,

    /// The invitation was accepted before; acceptance is one-way.
    #[error("invitation has already been accepted")]
    InvitationAlreadyAccepted,

    /// More than one day has passed since the challenge started.
    #[error("the join window for this challenge has closed")]
    JoinWindowClosed,

    /// The owner may never unsubscribe from their own challenge.
    #[error("the challenge owner cannot unsubscribe")]
    OwnerCannotLeave,

    /// Weekday recurrence is frozen once status rows have been generated.
    #[error("weekday recurrence cannot change after the challenge has started")]
    MaskLockedAfterStart,

    /// The invitation token could not be issued or failed verification.
    #[error("invalid invitation token")]
    InvalidToken(#[source] InvitationTokenError),

    /// Persistence failure unrelated to domain rules.
    #[error(transparent)]
    Repository(ChallengeRepositoryError),
}

impl From<ChallengeRepositoryError> for ChallengeServiceError {
    fn from(err: ChallengeRepositoryError) -> Self {
        match err {
            ChallengeRepositoryError::DuplicateMembership { .. } => Self::AlreadyMember,
            ChallengeRepositoryError::DuplicateInvitation { .. } => Self::AlreadyInvited,
            ChallengeRepositoryError::ChallengeNotFound(_)
            | ChallengeRepositoryError::MembershipNotFound { .. }
            | ChallengeRepositoryError::InvitationNotFound { .. }
            | ChallengeRepositoryError::TemplateNotFound(_)
            | ChallengeRepositoryError::StatusNotFound { .. } => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}
