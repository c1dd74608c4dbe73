//! Service layer for task template CRUD.

use super::{
    access::{require_member, require_owner},
    error::{ChallengeServiceError, ChallengeServiceResult},
};
use crate::challenge::domain::{
    Challenge, ChallengeId, ChallengeStatus, StateTransitionError, TaskTemplate, TemplateId,
    Title, UserId, WeekdayMask,
};
use crate::challenge::ports::ChallengeRepository;
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a task template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTemplateRequest {
    /// Template title.
    pub title: String,
    /// Template description.
    pub description: String,
    /// Raw weekday mask bits, Sunday at bit zero.
    pub weekdays: u8,
}

/// Request payload for updating a task template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTemplateRequest {
    /// Template to update.
    pub template_id: TemplateId,
    /// Challenge the template belongs to.
    pub challenge_id: ChallengeId,
    /// Calling user; must own the challenge.
    pub caller: UserId,
    /// Replacement title.
    pub title: String,
    /// Replacement description.
    pub description: String,
    /// Replacement weekday mask bits; leave unchanged to keep the mask.
    pub weekdays: Option<u8>,
}

/// Task template orchestration service.
#[derive(Clone)]
pub struct TaskTemplateService<R, C>
where
    R: ChallengeRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskTemplateService<R, C>
where
    R: ChallengeRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new template service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a template on a draft challenge.
    ///
    /// Templates cannot be added once the challenge has started: the
    /// generated status rows would not cover them.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty title or invalid mask,
    /// `NotFound`/`Forbidden` for authorization failures, or a transition
    /// conflict once the challenge has started or finished.
    pub async fn create(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
        request: CreateTemplateRequest,
    ) -> ChallengeServiceResult<TaskTemplate> {
        let challenge = require_owner(&*self.repository, challenge_id, caller).await?;
        Self::ensure_draft(&challenge, "add tasks to")?;
        let template = Self::build_template(challenge_id, request, &*self.clock)?;
        self.repository.create_template(&template).await?;
        Ok(template)
    }

    /// Creates a batch of templates on a draft challenge atomically.
    ///
    /// Every template is validated before any row is written; a single
    /// invalid entry rejects the whole batch and nothing is committed.
    ///
    /// # Errors
    ///
    /// As [`Self::create`], for any template in the batch.
    pub async fn create_batch(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
        requests: Vec<CreateTemplateRequest>,
    ) -> ChallengeServiceResult<Vec<TaskTemplate>> {
        let challenge = require_owner(&*self.repository, challenge_id, caller).await?;
        Self::ensure_draft(&challenge, "add tasks to")?;
        let templates = requests
            .into_iter()
            .map(|request| Self::build_template(challenge_id, request, &*self.clock))
            .collect::<Result<Vec<_>, _>>()?;
        self.repository.create_templates(&templates).await?;
        Ok(templates)
    }

    /// Updates a template's title, description, and (while the challenge is
    /// still in draft) its weekday mask.
    ///
    /// # Errors
    ///
    /// Returns `MaskLockedAfterStart` for a mask change on a started
    /// challenge, a transition conflict on a finished one, plus the usual
    /// validation and authorization failures.
    pub async fn update(
        &self,
        request: UpdateTemplateRequest,
    ) -> ChallengeServiceResult<TaskTemplate> {
        let challenge =
            require_owner(&*self.repository, request.challenge_id, request.caller).await?;
        if challenge.status() == ChallengeStatus::Finished {
            return Err(StateTransitionError::new("edit tasks of", challenge.status()).into());
        }

        let mut template = self
            .find_in_challenge(request.template_id, request.challenge_id)
            .await?;

        let title = Title::new(request.title)?;
        template.edit(title, request.description, &*self.clock);

        if let Some(bits) = request.weekdays {
            let mask = WeekdayMask::new(bits)?;
            if mask != template.weekdays() {
                if challenge.status() == ChallengeStatus::Started {
                    return Err(ChallengeServiceError::MaskLockedAfterStart);
                }
                template.reschedule(mask, &*self.clock);
            }
        }

        self.repository.update_template(&template).await?;
        Ok(template)
    }

    /// Deletes a template, cascading to its status rows.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Forbidden` for authorization failures or a
    /// transition conflict on a finished challenge.
    pub async fn delete(
        &self,
        template_id: TemplateId,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<()> {
        let challenge = require_owner(&*self.repository, challenge_id, caller).await?;
        if challenge.status() == ChallengeStatus::Finished {
            return Err(StateTransitionError::new("edit tasks of", challenge.status()).into());
        }
        let template = self.find_in_challenge(template_id, challenge_id).await?;
        self.repository.delete_template(template.id()).await?;
        Ok(())
    }

    /// Retrieves a template readable by the caller.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the template is absent, belongs to a
    /// different challenge, or the caller is not a member.
    pub async fn get(
        &self,
        template_id: TemplateId,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<TaskTemplate> {
        require_member(&*self.repository, challenge_id, caller).await?;
        self.find_in_challenge(template_id, challenge_id).await
    }

    /// Lists every template of a challenge readable by the caller.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the caller is not a member.
    pub async fn list(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<Vec<TaskTemplate>> {
        require_member(&*self.repository, challenge_id, caller).await?;
        Ok(self.repository.templates_for_challenge(challenge_id).await?)
    }

    /// Loads a template and confirms it belongs to the expected challenge;
    /// a mismatch is indistinguishable from absence.
    async fn find_in_challenge(
        &self,
        template_id: TemplateId,
        challenge_id: ChallengeId,
    ) -> ChallengeServiceResult<TaskTemplate> {
        let template = self
            .repository
            .find_template(template_id)
            .await?
            .ok_or(ChallengeServiceError::NotFound)?;
        if template.challenge_id() != challenge_id {
            return Err(ChallengeServiceError::NotFound);
        }
        Ok(template)
    }

    fn ensure_draft(challenge: &Challenge, action: &'static str) -> ChallengeServiceResult<()> {
        if challenge.status() == ChallengeStatus::Draft {
            Ok(())
        } else {
            Err(StateTransitionError::new(action, challenge.status()).into())
        }
    }

    fn build_template(
        challenge_id: ChallengeId,
        request: CreateTemplateRequest,
        clock: &C,
    ) -> ChallengeServiceResult<TaskTemplate> {
        let title = Title::new(request.title)?;
        let mask = WeekdayMask::new(request.weekdays)?;
        Ok(TaskTemplate::new(
            challenge_id,
            title,
            request.description,
            mask,
            clock,
        ))
    }
}
