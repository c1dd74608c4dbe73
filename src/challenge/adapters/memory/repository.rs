//! Thread-safe in-memory challenge repository.
//!
//! Composite operations take the write lock once and verify every
//! precondition before mutating anything, giving the same all-or-nothing
//! behaviour the Postgres adapter gets from real transactions.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::challenge::{
    domain::{
        Challenge, ChallengeId, Invitation, Membership, TaskStatus, TaskTemplate, TemplateId,
        UserId,
    },
    ports::{ChallengeRepository, ChallengeRepositoryError, ChallengeRepositoryResult},
};

type StatusKey = (UserId, TemplateId, NaiveDate);

/// Thread-safe in-memory challenge repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChallengeRepository {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    challenges: HashMap<ChallengeId, Challenge>,
    memberships: HashMap<(ChallengeId, UserId), Membership>,
    invitations: HashMap<(ChallengeId, UserId), Invitation>,
    templates: HashMap<TemplateId, TaskTemplate>,
    statuses: HashMap<StatusKey, TaskStatus>,
}

impl InMemoryChallengeRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ChallengeRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryState>> {
        self.state.read().map_err(|err| {
            ChallengeRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ChallengeRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryState>> {
        self.state.write().map_err(|err| {
            ChallengeRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Rejects a status insert when any produced key already exists.
fn ensure_no_status_overlap(
    state: &InMemoryState,
    statuses: &[TaskStatus],
) -> ChallengeRepositoryResult<()> {
    for status in statuses {
        let key = (status.user_id(), status.template_id(), status.date());
        if state.statuses.contains_key(&key) {
            return Err(ChallengeRepositoryError::DuplicateStatus {
                user: status.user_id(),
                template: status.template_id(),
                date: status.date(),
            });
        }
    }
    Ok(())
}

fn insert_statuses(state: &mut InMemoryState, statuses: &[TaskStatus]) {
    for status in statuses {
        let key = (status.user_id(), status.template_id(), status.date());
        state.statuses.insert(key, *status);
    }
}

#[async_trait]
impl ChallengeRepository for InMemoryChallengeRepository {
    async fn create_challenge(
        &self,
        challenge: &Challenge,
        owner: &Membership,
    ) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if state.challenges.contains_key(&challenge.id()) {
            return Err(ChallengeRepositoryError::DuplicateChallenge(challenge.id()));
        }
        state.challenges.insert(challenge.id(), challenge.clone());
        state
            .memberships
            .insert((owner.challenge_id(), owner.user_id()), owner.clone());
        Ok(())
    }

    async fn find_challenge(
        &self,
        id: ChallengeId,
    ) -> ChallengeRepositoryResult<Option<Challenge>> {
        let state = self.read()?;
        Ok(state.challenges.get(&id).cloned())
    }

    async fn challenges_for_user(
        &self,
        user: UserId,
    ) -> ChallengeRepositoryResult<Vec<Challenge>> {
        let state = self.read()?;
        let mut challenges: Vec<Challenge> = state
            .memberships
            .values()
            .filter(|membership| membership.user_id() == user)
            .filter_map(|membership| state.challenges.get(&membership.challenge_id()).cloned())
            .collect();
        challenges.sort_by_key(|challenge| (challenge.created_at(), challenge.id().into_inner()));
        Ok(challenges)
    }

    async fn update_challenge(&self, challenge: &Challenge) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.challenges.contains_key(&challenge.id()) {
            return Err(ChallengeRepositoryError::ChallengeNotFound(challenge.id()));
        }
        state.challenges.insert(challenge.id(), challenge.clone());
        Ok(())
    }

    async fn delete_challenge(&self, id: ChallengeId) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if state.challenges.remove(&id).is_none() {
            return Err(ChallengeRepositoryError::ChallengeNotFound(id));
        }
        state.memberships.retain(|(challenge, _), _| *challenge != id);
        state.invitations.retain(|(challenge, _), _| *challenge != id);
        let removed: Vec<TemplateId> = state
            .templates
            .values()
            .filter(|template| template.challenge_id() == id)
            .map(TaskTemplate::id)
            .collect();
        state
            .templates
            .retain(|_, template| template.challenge_id() != id);
        state
            .statuses
            .retain(|(_, template, _), _| !removed.contains(template));
        Ok(())
    }

    async fn start_challenge(
        &self,
        challenge: &Challenge,
        statuses: &[TaskStatus],
    ) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.challenges.contains_key(&challenge.id()) {
            return Err(ChallengeRepositoryError::ChallengeNotFound(challenge.id()));
        }
        ensure_no_status_overlap(&state, statuses)?;
        state.challenges.insert(challenge.id(), challenge.clone());
        insert_statuses(&mut state, statuses);
        Ok(())
    }

    async fn find_membership(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<Option<Membership>> {
        let state = self.read()?;
        Ok(state.memberships.get(&(challenge, user)).cloned())
    }

    async fn members_of(
        &self,
        challenge: ChallengeId,
    ) -> ChallengeRepositoryResult<Vec<Membership>> {
        let state = self.read()?;
        let mut members: Vec<Membership> = state
            .memberships
            .values()
            .filter(|membership| membership.challenge_id() == challenge)
            .cloned()
            .collect();
        members.sort_by_key(|membership| (membership.joined_at(), membership.user_id().into_inner()));
        Ok(members)
    }

    async fn remove_membership(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if state.memberships.remove(&(challenge, user)).is_none() {
            return Err(ChallengeRepositoryError::MembershipNotFound { challenge, user });
        }
        Ok(())
    }

    async fn create_invitation(&self, invitation: &Invitation) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        let key = (invitation.challenge_id(), invitation.user_id());
        if state.invitations.contains_key(&key) {
            return Err(ChallengeRepositoryError::DuplicateInvitation {
                challenge: invitation.challenge_id(),
                user: invitation.user_id(),
            });
        }
        state.invitations.insert(key, invitation.clone());
        Ok(())
    }

    async fn find_invitation(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<Option<Invitation>> {
        let state = self.read()?;
        Ok(state.invitations.get(&(challenge, user)).cloned())
    }

    async fn accept_invitation(
        &self,
        invitation: &Invitation,
        membership: &Membership,
        statuses: &[TaskStatus],
    ) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        let invitation_key = (invitation.challenge_id(), invitation.user_id());
        if !state.invitations.contains_key(&invitation_key) {
            return Err(ChallengeRepositoryError::InvitationNotFound {
                challenge: invitation.challenge_id(),
                user: invitation.user_id(),
            });
        }
        let membership_key = (membership.challenge_id(), membership.user_id());
        if state.memberships.contains_key(&membership_key) {
            return Err(ChallengeRepositoryError::DuplicateMembership {
                challenge: membership.challenge_id(),
                user: membership.user_id(),
            });
        }
        ensure_no_status_overlap(&state, statuses)?;

        state.invitations.insert(invitation_key, invitation.clone());
        state.memberships.insert(membership_key, membership.clone());
        insert_statuses(&mut state, statuses);
        Ok(())
    }

    async fn create_template(&self, template: &TaskTemplate) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if state.templates.contains_key(&template.id()) {
            return Err(ChallengeRepositoryError::DuplicateTemplate(template.id()));
        }
        state.templates.insert(template.id(), template.clone());
        Ok(())
    }

    async fn create_templates(
        &self,
        templates: &[TaskTemplate],
    ) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        for template in templates {
            if state.templates.contains_key(&template.id()) {
                return Err(ChallengeRepositoryError::DuplicateTemplate(template.id()));
            }
        }
        for template in templates {
            state.templates.insert(template.id(), template.clone());
        }
        Ok(())
    }

    async fn update_template(&self, template: &TaskTemplate) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.templates.contains_key(&template.id()) {
            return Err(ChallengeRepositoryError::TemplateNotFound(template.id()));
        }
        state.templates.insert(template.id(), template.clone());
        Ok(())
    }

    async fn delete_template(&self, id: TemplateId) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        if state.templates.remove(&id).is_none() {
            return Err(ChallengeRepositoryError::TemplateNotFound(id));
        }
        state.statuses.retain(|(_, template, _), _| *template != id);
        Ok(())
    }

    async fn find_template(
        &self,
        id: TemplateId,
    ) -> ChallengeRepositoryResult<Option<TaskTemplate>> {
        let state = self.read()?;
        Ok(state.templates.get(&id).cloned())
    }

    async fn templates_for_challenge(
        &self,
        challenge: ChallengeId,
    ) -> ChallengeRepositoryResult<Vec<TaskTemplate>> {
        let state = self.read()?;
        let mut templates: Vec<TaskTemplate> = state
            .templates
            .values()
            .filter(|template| template.challenge_id() == challenge)
            .cloned()
            .collect();
        templates.sort_by_key(|template| (template.created_at(), template.id().into_inner()));
        Ok(templates)
    }

    async fn find_status(
        &self,
        user: UserId,
        template: TemplateId,
        date: NaiveDate,
    ) -> ChallengeRepositoryResult<Option<TaskStatus>> {
        let state = self.read()?;
        Ok(state.statuses.get(&(user, template, date)).copied())
    }

    async fn update_status(&self, status: &TaskStatus) -> ChallengeRepositoryResult<()> {
        let mut state = self.write()?;
        let key = (status.user_id(), status.template_id(), status.date());
        if !state.statuses.contains_key(&key) {
            return Err(ChallengeRepositoryError::StatusNotFound {
                user: status.user_id(),
                template: status.template_id(),
                date: status.date(),
            });
        }
        state.statuses.insert(key, *status);
        Ok(())
    }

    async fn statuses_for_date(
        &self,
        challenge: ChallengeId,
        date: NaiveDate,
    ) -> ChallengeRepositoryResult<Vec<(TaskTemplate, TaskStatus)>> {
        let state = self.read()?;
        let mut rows: Vec<(TaskTemplate, TaskStatus)> = state
            .statuses
            .values()
            .filter(|status| status.date() == date)
            .filter_map(|status| {
                state
                    .templates
                    .get(&status.template_id())
                    .filter(|template| template.challenge_id() == challenge)
                    .map(|template| (template.clone(), *status))
            })
            .collect();
        rows.sort_by_key(|(template, status)| {
            (template.id().into_inner(), status.user_id().into_inner())
        });
        Ok(rows)
    }
}
