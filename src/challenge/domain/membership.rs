//! Membership and invitation records binding users to challenges.
//!
//! Both records are keyed by the `(challenge, user)` pair. Memberships carry
//! the authorization role; invitations gate the creation of participant
//! memberships and flip from pending to accepted exactly once.

use super::{
    error::{ParseInvitationStatusError, ParseMemberRoleError},
    ids::{ChallengeId, UserId},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Role a user holds within a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Creator of the challenge; exactly one per challenge, may never leave.
    Owner,
    /// Invited member; may record progress and unsubscribe.
    Participant,
}

impl MemberRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Participant => "participant",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = ParseMemberRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "owner" => Ok(Self::Owner),
            "participant" => Ok(Self::Participant),
            _ => Err(ParseMemberRoleError(value.to_owned())),
        }
    }
}

/// A user's membership of a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    challenge_id: ChallengeId,
    user_id: UserId,
    role: MemberRole,
    joined_at: DateTime<Utc>,
}

impl Membership {
    /// Creates the owner membership recorded alongside a new challenge.
    #[must_use]
    pub fn owner(challenge_id: ChallengeId, user_id: UserId, clock: &impl Clock) -> Self {
        Self {
            challenge_id,
            user_id,
            role: MemberRole::Owner,
            joined_at: clock.utc(),
        }
    }

    /// Creates a participant membership for an accepted invitation.
    #[must_use]
    pub fn participant(challenge_id: ChallengeId, user_id: UserId, clock: &impl Clock) -> Self {
        Self {
            challenge_id,
            user_id,
            role: MemberRole::Participant,
            joined_at: clock.utc(),
        }
    }

    /// Reconstructs a membership from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        challenge_id: ChallengeId,
        user_id: UserId,
        role: MemberRole,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            challenge_id,
            user_id,
            role,
            joined_at,
        }
    }

    /// Returns the challenge the membership belongs to.
    #[must_use]
    pub const fn challenge_id(&self) -> ChallengeId {
        self.challenge_id
    }

    /// Returns the member's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the member's role.
    #[must_use]
    pub const fn role(&self) -> MemberRole {
        self.role
    }

    /// Returns whether the member holds the owner role.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        matches!(self.role, MemberRole::Owner)
    }

    /// Returns when the membership was created.
    #[must_use]
    pub const fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }
}

/// Invitation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Issued but not yet accepted.
    Pending,
    /// Accepted; a matching participant membership exists.
    Accepted,
}

impl InvitationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

impl TryFrom<&str> for InvitationStatus {
    type Error = ParseInvitationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            _ => Err(ParseInvitationStatusError(value.to_owned())),
        }
    }
}

/// A pending-to-accepted record gating a new participant membership.
///
/// The invitation row, not the signed token, carries the one-time-use
/// guarantee: replaying a still-valid token after acceptance fails on the
/// status recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    challenge_id: ChallengeId,
    user_id: UserId,
    status: InvitationStatus,
    invited_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Creates a pending invitation.
    #[must_use]
    pub fn pending(challenge_id: ChallengeId, user_id: UserId, clock: &impl Clock) -> Self {
        Self {
            challenge_id,
            user_id,
            status: InvitationStatus::Pending,
            invited_at: clock.utc(),
            responded_at: None,
        }
    }

    /// Reconstructs an invitation from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        challenge_id: ChallengeId,
        user_id: UserId,
        status: InvitationStatus,
        invited_at: DateTime<Utc>,
        responded_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            challenge_id,
            user_id,
            status,
            invited_at,
            responded_at,
        }
    }

    /// Returns the challenge the invitation is for.
    #[must_use]
    pub const fn challenge_id(&self) -> ChallengeId {
        self.challenge_id
    }

    /// Returns the invited user's identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the invitation status.
    #[must_use]
    pub const fn status(&self) -> InvitationStatus {
        self.status
    }

    /// Returns whether the invitation has already been accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.status, InvitationStatus::Accepted)
    }

    /// Returns when the invitation was issued.
    #[must_use]
    pub const fn invited_at(&self) -> DateTime<Utc> {
        self.invited_at
    }

    /// Returns when the invitation was accepted, if it has been.
    #[must_use]
    pub const fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    /// Marks the invitation accepted.
    ///
    /// The pending → accepted transition is one-way; callers must reject a
    /// second acceptance before reaching this point.
    pub fn accept(&mut self, clock: &impl Clock) {
        self.status = InvitationStatus::Accepted;
        self.responded_at = Some(clock.utc());
    }
}
