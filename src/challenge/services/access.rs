//! Centralized role-based authorization for challenge operations.
//!
//! Every read requires some membership; every mutation requires the owner
//! role. A missing membership surfaces as [`ChallengeServiceError::NotFound`]
//! so callers cannot probe for challenges they are not part of; a present
//! membership with the wrong role surfaces as
//! [`ChallengeServiceError::Forbidden`] since existence is already implied.

use super::error::{ChallengeServiceError, ChallengeServiceResult};
use crate::challenge::domain::{Challenge, ChallengeId, Membership, UserId};
use crate::challenge::ports::ChallengeRepository;

/// Loads the challenge for a caller holding any membership of it.
pub(super) async fn require_member<R: ChallengeRepository>(
    repository: &R,
    challenge_id: ChallengeId,
    caller: UserId,
) -> ChallengeServiceResult<(Challenge, Membership)> {
    let membership = repository
        .find_membership(challenge_id, caller)
        .await?
        .ok_or(ChallengeServiceError::NotFound)?;
    let challenge = repository
        .find_challenge(challenge_id)
        .await?
        .ok_or(ChallengeServiceError::NotFound)?;
    Ok((challenge, membership))
}

/// Loads the challenge for a caller holding its owner membership.
pub(super) async fn require_owner<R: ChallengeRepository>(
    repository: &R,
    challenge_id: ChallengeId,
    caller: UserId,
) -> ChallengeServiceResult<Challenge> {
    let (challenge, membership) = require_member(repository, challenge_id, caller).await?;
    if !membership.is_owner() {
        return Err(ChallengeServiceError::Forbidden);
    }
    Ok(challenge)
}
