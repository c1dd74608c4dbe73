//! Service layer for invitations, acceptance, and unsubscription.

use super::{
    access::require_owner,
    error::{ChallengeServiceError, ChallengeServiceResult},
    token::{InvitationTokenError, InvitationTokenService},
};
use crate::challenge::domain::{
    Challenge, ChallengeId, ChallengeStatus, Invitation, Membership, StateTransitionError,
    TaskStatus, UserId, generate_statuses,
};
use crate::challenge::ports::{ChallengeRepository, InvitationNotifier};
use minijinja::{Environment, context};
use mockable::Clock;
use std::sync::Arc;

const INVITATION_SUBJECT: &str = "Challenge Invitation";

const INVITATION_BODY_TEMPLATE: &str = "\
You have been invited to join the challenge \"{{ title }}\".
Click the link to accept: {{ accept_url }}?token={{ token }}
The invitation expires in 24 hours.";

/// Request payload for inviting a user to a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteUserRequest {
    /// Challenge to invite into.
    pub challenge_id: ChallengeId,
    /// Calling user; must own the challenge.
    pub caller: UserId,
    /// User to invite.
    pub invitee: UserId,
    /// Address the invitation notification is delivered to.
    pub invitee_email: String,
}

/// Membership orchestration service: invite, accept, unsubscribe.
#[derive(Clone)]
pub struct MembershipService<R, N, C>
where
    R: ChallengeRepository,
    N: InvitationNotifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    notifier: Arc<N>,
    tokens: Arc<InvitationTokenService>,
    clock: Arc<C>,
    accept_url: String,
}

impl<R, N, C> MembershipService<R, N, C>
where
    R: ChallengeRepository,
    N: InvitationNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a new membership service.
    ///
    /// `accept_url` is the public endpoint invitation links point at; the
    /// signed token is appended as a query parameter.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        tokens: Arc<InvitationTokenService>,
        clock: Arc<C>,
        accept_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            notifier,
            tokens,
            clock,
            accept_url: accept_url.into(),
        }
    }

    /// Invites a user to a challenge.
    ///
    /// The pending invitation commits on its own; the notification is
    /// delivered afterwards, best-effort. A delivery failure is logged and
    /// does not undo the invitation, which stays the source of truth.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Forbidden` for authorization failures, a
    /// transition conflict for a finished challenge, `JoinWindowClosed`
    /// once more than a day has passed since the start, and
    /// `AlreadyMember`/`AlreadyInvited` conflicts.
    pub async fn invite(&self, request: InviteUserRequest) -> ChallengeServiceResult<Invitation> {
        let challenge =
            require_owner(&*self.repository, request.challenge_id, request.caller).await?;
        self.ensure_joinable(&challenge, "invite a user to")?;

        if self
            .repository
            .find_membership(request.challenge_id, request.invitee)
            .await?
            .is_some()
        {
            return Err(ChallengeServiceError::AlreadyMember);
        }

        let invitation = Invitation::pending(request.challenge_id, request.invitee, &*self.clock);
        self.repository.create_invitation(&invitation).await?;

        let token = self
            .tokens
            .issue(request.invitee, request.challenge_id, &*self.clock)
            .map_err(ChallengeServiceError::InvalidToken)?;
        self.send_invitation(&challenge, &request.invitee_email, &token)
            .await;

        Ok(invitation)
    }

    /// Accepts an invitation by token.
    ///
    /// Creates the participant membership, flips the invitation to
    /// accepted, and — when the challenge has already started — generates
    /// the new member's status rows over the full active range, all in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for a bad, expired, or wrong-recipient token,
    /// `NotFound` when no invitation exists, `InvitationAlreadyAccepted`
    /// for a replay, the join-window and finished-challenge conflicts, and
    /// `AlreadyMember` when a membership appeared concurrently.
    pub async fn accept(&self, token: &str, caller: UserId) -> ChallengeServiceResult<Challenge> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(ChallengeServiceError::InvalidToken)?;
        if claims.user() != caller {
            return Err(ChallengeServiceError::InvalidToken(
                InvitationTokenError::WrongRecipient,
            ));
        }

        let challenge_id = claims.challenge();
        let user = claims.user();

        let mut invitation = self
            .repository
            .find_invitation(challenge_id, user)
            .await?
            .ok_or(ChallengeServiceError::NotFound)?;
        if invitation.is_accepted() {
            return Err(ChallengeServiceError::InvitationAlreadyAccepted);
        }

        let challenge = self
            .repository
            .find_challenge(challenge_id)
            .await?
            .ok_or(ChallengeServiceError::NotFound)?;
        self.ensure_joinable(&challenge, "join")?;

        if self
            .repository
            .find_membership(challenge_id, user)
            .await?
            .is_some()
        {
            return Err(ChallengeServiceError::AlreadyMember);
        }

        let membership = Membership::participant(challenge_id, user, &*self.clock);
        invitation.accept(&*self.clock);
        let statuses = self.acceptance_fanout(&challenge, user).await?;

        self.repository
            .accept_invitation(&invitation, &membership, &statuses)
            .await?;
        Ok(challenge)
    }

    /// Removes the caller's own membership.
    ///
    /// Historical status rows are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the caller is not a member,
    /// `OwnerCannotLeave` for the owner, and a transition conflict for a
    /// finished challenge.
    pub async fn unsubscribe(
        &self,
        challenge_id: ChallengeId,
        caller: UserId,
    ) -> ChallengeServiceResult<()> {
        let membership = self
            .repository
            .find_membership(challenge_id, caller)
            .await?
            .ok_or(ChallengeServiceError::NotFound)?;
        if membership.is_owner() {
            return Err(ChallengeServiceError::OwnerCannotLeave);
        }

        let challenge = self
            .repository
            .find_challenge(challenge_id)
            .await?
            .ok_or(ChallengeServiceError::NotFound)?;
        if challenge.status() == ChallengeStatus::Finished {
            return Err(StateTransitionError::new("unsubscribe from", challenge.status()).into());
        }

        self.repository
            .remove_membership(challenge_id, caller)
            .await?;
        Ok(())
    }

    /// Rejects joining once the challenge is finished or more than one day
    /// past its start. The grace window compares against the start date:
    /// joins stay open through the challenge's first day.
    fn ensure_joinable(
        &self,
        challenge: &Challenge,
        action: &'static str,
    ) -> ChallengeServiceResult<()> {
        match challenge.status() {
            ChallengeStatus::Draft => Ok(()),
            ChallengeStatus::Started => {
                let today = self.clock.utc().date_naive();
                let window_open = challenge.start_date().is_some_and(|start| today <= start);
                if window_open {
                    Ok(())
                } else {
                    Err(ChallengeServiceError::JoinWindowClosed)
                }
            }
            ChallengeStatus::Finished => {
                Err(StateTransitionError::new(action, challenge.status()).into())
            }
        }
    }

    /// Generates the status rows a newly accepted member needs: the full
    /// active range for a started challenge, nothing for a draft one.
    async fn acceptance_fanout(
        &self,
        challenge: &Challenge,
        user: UserId,
    ) -> ChallengeServiceResult<Vec<TaskStatus>> {
        let Some(range) = challenge.active_range() else {
            return Ok(Vec::new());
        };
        let templates = self
            .repository
            .templates_for_challenge(challenge.id())
            .await?;
        Ok(generate_statuses(range, &templates, &[user]))
    }

    async fn send_invitation(&self, challenge: &Challenge, recipient: &str, token: &str) {
        let body = Environment::new()
            .render_str(
                INVITATION_BODY_TEMPLATE,
                context! {
                    title => challenge.title().as_str(),
                    accept_url => self.accept_url.as_str(),
                    token => token,
                },
            )
            .unwrap_or_else(|_| format!("{}?token={token}", self.accept_url));

        if let Err(err) = self.notifier.notify(recipient, INVITATION_SUBJECT, &body).await {
            tracing::warn!(
                challenge_id = %challenge.id(),
                recipient,
                error = %err,
                "invitation notification failed; invitation remains pending"
            );
        }
    }
}
