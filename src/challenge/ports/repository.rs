//! Repository port for challenge persistence.
//!
//! Multi-row operations on this trait (`create_challenge`,
//! `start_challenge`, `accept_invitation`, `create_templates`) are single
//! transactional units: implementations apply every row or none. The
//! services layer relies on that contract for the all-or-nothing semantics
//! of starting a challenge and accepting an invitation, and on the
//! `(user, template, date)` unique key to resolve concurrent fan-out races.

use crate::challenge::domain::{
    Challenge, ChallengeId, Invitation, Membership, TaskStatus, TaskTemplate, TemplateId, UserId,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

/// Result type for challenge repository operations.
pub type ChallengeRepositoryResult<T> = Result<T, ChallengeRepositoryError>;

/// Challenge persistence contract.
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Stores a new challenge together with its owner membership, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::DuplicateChallenge`] when the
    /// challenge identifier already exists.
    async fn create_challenge(
        &self,
        challenge: &Challenge,
        owner: &Membership,
    ) -> ChallengeRepositoryResult<()>;

    /// Finds a challenge by identifier.
    ///
    /// Returns `None` when the challenge does not exist.
    async fn find_challenge(&self, id: ChallengeId)
    -> ChallengeRepositoryResult<Option<Challenge>>;

    /// Returns every challenge the user holds a membership of.
    async fn challenges_for_user(&self, user: UserId) -> ChallengeRepositoryResult<Vec<Challenge>>;

    /// Persists changes to an existing challenge.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::ChallengeNotFound`] when the
    /// challenge does not exist.
    async fn update_challenge(&self, challenge: &Challenge) -> ChallengeRepositoryResult<()>;

    /// Deletes a challenge and cascades to its memberships, invitations,
    /// templates, and status rows.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::ChallengeNotFound`] when the
    /// challenge does not exist.
    async fn delete_challenge(&self, id: ChallengeId) -> ChallengeRepositoryResult<()>;

    /// Persists a started challenge together with its generated status
    /// rows, atomically. Any failure rolls back the state transition too.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::ChallengeNotFound`] when the
    /// challenge does not exist and
    /// [`ChallengeRepositoryError::DuplicateStatus`] when a produced row
    /// collides with existing coverage.
    async fn start_challenge(
        &self,
        challenge: &Challenge,
        statuses: &[TaskStatus],
    ) -> ChallengeRepositoryResult<()>;

    /// Finds a membership by its `(challenge, user)` key.
    ///
    /// Returns `None` when the user is not a member.
    async fn find_membership(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<Option<Membership>>;

    /// Returns every membership of the challenge.
    async fn members_of(&self, challenge: ChallengeId)
    -> ChallengeRepositoryResult<Vec<Membership>>;

    /// Deletes a membership.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::MembershipNotFound`] when the
    /// user is not a member.
    async fn remove_membership(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<()>;

    /// Stores a new pending invitation.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::DuplicateInvitation`] when an
    /// invitation for the `(challenge, user)` pair already exists.
    async fn create_invitation(&self, invitation: &Invitation) -> ChallengeRepositoryResult<()>;

    /// Finds an invitation by its `(challenge, user)` key.
    ///
    /// Returns `None` when no invitation exists.
    async fn find_invitation(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<Option<Invitation>>;

    /// Records an accepted invitation: persists the accepted invitation,
    /// the new participant membership, and the member's generated status
    /// rows in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::DuplicateMembership`] when the
    /// user is already a member (two concurrent acceptances resolve here:
    /// exactly one succeeds) and
    /// [`ChallengeRepositoryError::InvitationNotFound`] when the invitation
    /// row has disappeared.
    async fn accept_invitation(
        &self,
        invitation: &Invitation,
        membership: &Membership,
        statuses: &[TaskStatus],
    ) -> ChallengeRepositoryResult<()>;

    /// Stores a new task template.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::DuplicateTemplate`] when the
    /// template identifier already exists.
    async fn create_template(&self, template: &TaskTemplate) -> ChallengeRepositoryResult<()>;

    /// Stores a batch of task templates atomically; partial batches are
    /// never committed.
    ///
    /// # Errors
    ///
    /// As [`Self::create_template`], for any template in the batch.
    async fn create_templates(&self, templates: &[TaskTemplate])
    -> ChallengeRepositoryResult<()>;

    /// Persists changes to an existing template.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::TemplateNotFound`] when the
    /// template does not exist.
    async fn update_template(&self, template: &TaskTemplate) -> ChallengeRepositoryResult<()>;

    /// Deletes a template and cascades to its status rows.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::TemplateNotFound`] when the
    /// template does not exist.
    async fn delete_template(&self, id: TemplateId) -> ChallengeRepositoryResult<()>;

    /// Finds a template by identifier.
    ///
    /// Returns `None` when the template does not exist.
    async fn find_template(&self, id: TemplateId)
    -> ChallengeRepositoryResult<Option<TaskTemplate>>;

    /// Returns every template attached to the challenge.
    async fn templates_for_challenge(
        &self,
        challenge: ChallengeId,
    ) -> ChallengeRepositoryResult<Vec<TaskTemplate>>;

    /// Finds a status row by its `(user, template, date)` key.
    ///
    /// Returns `None` when no row exists, which means the date's weekday
    /// did not match the template's mask or the date lies outside the
    /// challenge's active range.
    async fn find_status(
        &self,
        user: UserId,
        template: TemplateId,
        date: NaiveDate,
    ) -> ChallengeRepositoryResult<Option<TaskStatus>>;

    /// Persists changes to an existing status row.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeRepositoryError::StatusNotFound`] when the row
    /// does not exist.
    async fn update_status(&self, status: &TaskStatus) -> ChallengeRepositoryResult<()>;

    /// Returns every status row of the challenge for the given date, paired
    /// with the template it was generated from.
    async fn statuses_for_date(
        &self,
        challenge: ChallengeId,
        date: NaiveDate,
    ) -> ChallengeRepositoryResult<Vec<(TaskTemplate, TaskStatus)>>;
}

/// Errors returned by challenge repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ChallengeRepositoryError {
    /// A challenge with the same identifier already exists.
    #[error("duplicate challenge identifier: {0}")]
    DuplicateChallenge(ChallengeId),

    /// The `(challenge, user)` membership pair already exists.
    #[error("user {user} is already a member of challenge {challenge}")]
    DuplicateMembership {
        /// Challenge identifier.
        challenge: ChallengeId,
        /// User identifier.
        user: UserId,
    },

    /// The `(challenge, user)` invitation pair already exists.
    #[error("user {user} is already invited to challenge {challenge}")]
    DuplicateInvitation {
        /// Challenge identifier.
        challenge: ChallengeId,
        /// User identifier.
        user: UserId,
    },

    /// A template with the same identifier already exists.
    #[error("duplicate template identifier: {0}")]
    DuplicateTemplate(TemplateId),

    /// The `(user, template, date)` status key already exists.
    #[error("status row for user {user}, template {template}, date {date} already exists")]
    DuplicateStatus {
        /// User identifier.
        user: UserId,
        /// Template identifier.
        template: TemplateId,
        /// Covered date.
        date: NaiveDate,
    },

    /// The challenge was not found.
    #[error("challenge not found: {0}")]
    ChallengeNotFound(ChallengeId),

    /// The membership was not found.
    #[error("user {user} is not a member of challenge {challenge}")]
    MembershipNotFound {
        /// Challenge identifier.
        challenge: ChallengeId,
        /// User identifier.
        user: UserId,
    },

    /// The invitation was not found.
    #[error("no invitation for user {user} to challenge {challenge}")]
    InvitationNotFound {
        /// Challenge identifier.
        challenge: ChallengeId,
        /// User identifier.
        user: UserId,
    },

    /// The template was not found.
    #[error("template not found: {0}")]
    TemplateNotFound(TemplateId),

    /// The status row was not found.
    #[error("no status row for user {user}, template {template}, date {date}")]
    StatusNotFound {
        /// User identifier.
        user: UserId,
        /// Template identifier.
        template: TemplateId,
        /// Requested date.
        date: NaiveDate,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChallengeRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
