//! Service layer for recording daily task progress.

use super::{
    access::require_member,
    error::{ChallengeServiceError, ChallengeServiceResult},
};
use crate::challenge::domain::{
    ChallengeDomainError, ChallengeId, ChallengeStatus, Completion, StateTransitionError,
    TaskStatus, TaskTemplate, TemplateId, UserId,
};
use crate::challenge::ports::ChallengeRepository;
use chrono::NaiveDate;
use mockable::Clock;
use std::sync::Arc;

/// A status row paired with the template it was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateWithStatus {
    /// The recurring task definition.
    pub template: TaskTemplate,
    /// The per-user, per-day record.
    pub status: TaskStatus,
}

/// Request payload for recording a task's completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTaskStatusRequest {
    /// Template the status row belongs to.
    pub template_id: TemplateId,
    /// Challenge the template belongs to.
    pub challenge_id: ChallengeId,
    /// Calling user; must be a member, and owns the row being updated.
    pub caller: UserId,
    /// Date of the row; must be the current day.
    pub date: NaiveDate,
    /// The completion state to record.
    pub completion: Completion,
}

/// Task status orchestration service.
#[derive(Clone)]
pub struct TaskStatusService<R, C>
where
    R: ChallengeRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskStatusService<R, C>
where
    R: ChallengeRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task status service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Overwrites the caller's completion state for one task on the
    /// current day.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing membership, template, or row (a
    /// missing row means the day's weekday is not in the template's mask),
    /// a transition conflict unless the challenge is started, and a
    /// validation error when the date is not today — no backdating or
    /// future-dating.
    pub async fn update(
        &self,
        request: UpdateTaskStatusRequest,
    ) -> ChallengeServiceResult<TaskStatus> {
        let (challenge, _) =
            require_member(&*self.repository, request.challenge_id, request.caller).await?;

        let template = self
            .repository
            .find_template(request.template_id)
            .await?
            .ok_or(ChallengeServiceError::NotFound)?;
        if template.challenge_id() != request.challenge_id {
            return Err(ChallengeServiceError::NotFound);
        }

        if challenge.status() != ChallengeStatus::Started {
            return Err(
                StateTransitionError::new("record progress on", challenge.status()).into(),
            );
        }

        let today = self.clock.utc().date_naive();
        if request.date != today {
            return Err(ChallengeDomainError::StatusDateNotToday {
                got: request.date,
                today,
            }
            .into());
        }

        let mut status = self
            .repository
            .find_status(request.caller, request.template_id, request.date)
            .await?
            .ok_or(ChallengeServiceError::NotFound)?;
        status.record(request.completion);
        self.repository.update_status(&status).await?;
        Ok(status)
    }

    /// Lists every member's status rows for a challenge on the given date,
    /// each paired with its template.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the caller is not a member.
    pub async fn list_for_date(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
        date: NaiveDate,
    ) -> ChallengeServiceResult<Vec<TemplateWithStatus>> {
        require_member(&*self.repository, challenge_id, caller).await?;
        let rows = self.repository.statuses_for_date(challenge_id, date).await?;
        Ok(rows
            .into_iter()
            .map(|(template, status)| TemplateWithStatus { template, status })
            .collect())
    }
}
