//! Service layer for the challenge lifecycle: create, start, finish, and
//! draft-time editing.

use super::{
    access::{require_member, require_owner},
    error::ChallengeServiceResult,
};
use crate::challenge::domain::{
    Challenge, ChallengeId, DurationDays, Membership, Title, UserId, generate_statuses,
};
use crate::challenge::ports::ChallengeRepository;
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a draft challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChallengeRequest {
    /// Challenge title.
    pub title: String,
    /// Challenge description.
    pub description: String,
    /// Duration in days, validated to `1..=7`.
    pub days: u8,
    /// User who will own the challenge.
    pub owner: UserId,
}

/// Request payload for editing a draft challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateChallengeRequest {
    /// Challenge to edit.
    pub challenge_id: ChallengeId,
    /// Calling user; must own the challenge.
    pub caller: UserId,
    /// Replacement title.
    pub title: String,
    /// Replacement description.
    pub description: String,
}

/// Challenge lifecycle orchestration service.
#[derive(Clone)]
pub struct ChallengeLifecycleService<R, C>
where
    R: ChallengeRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ChallengeLifecycleService<R, C>
where
    R: ChallengeRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a draft challenge and its owner membership atomically.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty title or a duration outside
    /// `1..=7`, or a repository error when persistence fails.
    pub async fn create(
        &self,
        request: CreateChallengeRequest,
    ) -> ChallengeServiceResult<Challenge> {
        let title = Title::new(request.title)?;
        let days = DurationDays::new(request.days)?;
        let challenge = Challenge::new(title, request.description, days, &*self.clock);
        let owner = Membership::owner(challenge.id(), request.owner, &*self.clock);
        self.repository.create_challenge(&challenge, &owner).await?;
        Ok(challenge)
    }

    /// Retrieves a challenge readable by the caller.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the challenge is absent or the caller is not
    /// a member of it.
    pub async fn get(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<Challenge> {
        let (challenge, _) = require_member(&*self.repository, challenge_id, caller).await?;
        Ok(challenge)
    }

    /// Lists every challenge the user belongs to.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn list_for_user(&self, user: UserId) -> ChallengeServiceResult<Vec<Challenge>> {
        Ok(self.repository.challenges_for_user(user).await?)
    }

    /// Starts a draft challenge.
    ///
    /// Fixes the date range at `[today, today + days)`, then generates one
    /// not-started status row per (member, template, matching day) and
    /// persists the state transition and every row in one transaction; a
    /// generation failure rolls back the transition too.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Forbidden` for authorization failures, a
    /// transition conflict unless the challenge is in draft, or a
    /// repository error when the transaction fails.
    pub async fn start(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<Challenge> {
        let mut challenge = require_owner(&*self.repository, challenge_id, caller).await?;
        let today = self.clock.utc().date_naive();
        challenge.start(today, &*self.clock)?;

        let members = self.repository.members_of(challenge_id).await?;
        let users: Vec<UserId> = members.iter().map(Membership::user_id).collect();
        let templates = self.repository.templates_for_challenge(challenge_id).await?;

        let statuses = challenge
            .active_range()
            .map(|range| generate_statuses(range, &templates, &users))
            .unwrap_or_default();

        self.repository
            .start_challenge(&challenge, &statuses)
            .await?;
        Ok(challenge)
    }

    /// Finishes a started challenge. Status rows remain as history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Forbidden` for authorization failures, a
    /// transition conflict unless the challenge has started, or a
    /// repository error when persistence fails.
    pub async fn finish(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<Challenge> {
        let mut challenge = require_owner(&*self.repository, challenge_id, caller).await?;
        challenge.finish(&*self.clock)?;
        self.repository.update_challenge(&challenge).await?;
        Ok(challenge)
    }

    /// Edits the title and description of a draft challenge.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty title, `NotFound`/`Forbidden`
    /// for authorization failures, or a transition conflict once the
    /// challenge has started or finished.
    pub async fn update(
        &self,
        request: UpdateChallengeRequest,
    ) -> ChallengeServiceResult<Challenge> {
        let mut challenge =
            require_owner(&*self.repository, request.challenge_id, request.caller).await?;
        let title = Title::new(request.title)?;
        challenge.edit(title, request.description, &*self.clock)?;
        self.repository.update_challenge(&challenge).await?;
        Ok(challenge)
    }

    /// Deletes a draft challenge and everything attached to it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Forbidden` for authorization failures or a
    /// transition conflict once the challenge has started or finished.
    pub async fn delete(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<()> {
        let challenge = require_owner(&*self.repository, challenge_id, caller).await?;
        challenge.ensure_deletable()?;
        self.repository.delete_challenge(challenge_id).await?;
        Ok(())
    }
}
