//! Diesel row models and domain conversions for challenge persistence.

use super::schema::{
    challenge_invitations, challenge_members, challenges, task_statuses, task_templates,
};
use crate::challenge::domain::{
    Challenge, ChallengeId, ChallengeStatus, Completion, DurationDays, Invitation,
    InvitationStatus, MemberRole, Membership, PersistedChallengeData, PersistedTemplateData,
    TaskStatus, TaskTemplate, TemplateId, Title, UserId,
};
use crate::challenge::ports::ChallengeRepositoryError;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Query result row for challenge records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = challenges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChallengeRow {
    /// Challenge identifier.
    pub id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Lifecycle status.
    pub status: String,
    /// Duration in days.
    pub days: i32,
    /// First active day.
    pub start_date: Option<NaiveDate>,
    /// Exclusive end day.
    pub end_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ChallengeRow {
    /// Builds a row from the domain aggregate.
    #[must_use]
    pub fn from_domain(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id().into_inner(),
            title: challenge.title().as_str().to_owned(),
            description: challenge.description().to_owned(),
            status: challenge.status().as_str().to_owned(),
            days: i32::from(challenge.days().value()),
            start_date: challenge.start_date(),
            end_date: challenge.end_date(),
            created_at: challenge.created_at(),
            updated_at: challenge.updated_at(),
        }
    }

    /// Reconstructs the domain aggregate.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when a stored value fails domain
    /// validation, which indicates row corruption.
    pub fn into_domain(self) -> Result<Challenge, ChallengeRepositoryError> {
        let days = u8::try_from(self.days)
            .ok()
            .and_then(|value| DurationDays::new(value).ok())
            .ok_or_else(|| corrupt_row("challenges.days", &self.days.to_string()))?;
        let status = ChallengeStatus::try_from(self.status.as_str())
            .map_err(ChallengeRepositoryError::persistence)?;
        let title =
            Title::new(self.title).map_err(ChallengeRepositoryError::persistence)?;
        Ok(Challenge::from_persisted(PersistedChallengeData {
            id: ChallengeId::from_uuid(self.id),
            title,
            description: self.description,
            status,
            days,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Query result row for membership records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = challenge_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipRow {
    /// Owning challenge.
    pub challenge_id: uuid::Uuid,
    /// Member's user identifier.
    pub user_id: uuid::Uuid,
    /// Member role.
    pub role: String,
    /// When the membership was created.
    pub joined_at: DateTime<Utc>,
}

impl MembershipRow {
    /// Builds a row from the domain record.
    #[must_use]
    pub fn from_domain(membership: &Membership) -> Self {
        Self {
            challenge_id: membership.challenge_id().into_inner(),
            user_id: membership.user_id().into_inner(),
            role: membership.role().as_str().to_owned(),
            joined_at: membership.joined_at(),
        }
    }

    /// Reconstructs the domain record.
    ///
    /// # Errors
    ///
    /// Returns a persistence error for an unknown role value.
    pub fn into_domain(self) -> Result<Membership, ChallengeRepositoryError> {
        let role = MemberRole::try_from(self.role.as_str())
            .map_err(ChallengeRepositoryError::persistence)?;
        Ok(Membership::from_persisted(
            ChallengeId::from_uuid(self.challenge_id),
            UserId::from_uuid(self.user_id),
            role,
            self.joined_at,
        ))
    }
}

/// Query result row for invitation records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = challenge_invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvitationRow {
    /// Challenge invited into.
    pub challenge_id: uuid::Uuid,
    /// Invited user.
    pub user_id: uuid::Uuid,
    /// Invitation status.
    pub status: String,
    /// When the invitation was issued.
    pub invited_at: DateTime<Utc>,
    /// When the invitation was accepted.
    pub responded_at: Option<DateTime<Utc>>,
}

impl InvitationRow {
    /// Builds a row from the domain record.
    #[must_use]
    pub fn from_domain(invitation: &Invitation) -> Self {
        Self {
            challenge_id: invitation.challenge_id().into_inner(),
            user_id: invitation.user_id().into_inner(),
            status: invitation.status().as_str().to_owned(),
            invited_at: invitation.invited_at(),
            responded_at: invitation.responded_at(),
        }
    }

    /// Reconstructs the domain record.
    ///
    /// # Errors
    ///
    /// Returns a persistence error for an unknown status value.
    pub fn into_domain(self) -> Result<Invitation, ChallengeRepositoryError> {
        let status = InvitationStatus::try_from(self.status.as_str())
            .map_err(ChallengeRepositoryError::persistence)?;
        Ok(Invitation::from_persisted(
            ChallengeId::from_uuid(self.challenge_id),
            UserId::from_uuid(self.user_id),
            status,
            self.invited_at,
            self.responded_at,
        ))
    }
}

/// Query result row for task template records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TemplateRow {
    /// Template identifier.
    pub id: uuid::Uuid,
    /// Owning challenge.
    pub challenge_id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Weekday recurrence mask.
    pub weekdays: i16,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TemplateRow {
    /// Builds a row from the domain record.
    #[must_use]
    pub fn from_domain(template: &TaskTemplate) -> Self {
        Self {
            id: template.id().into_inner(),
            challenge_id: template.challenge_id().into_inner(),
            title: template.title().as_str().to_owned(),
            description: template.description().to_owned(),
            weekdays: i16::from(template.weekdays().bits()),
            created_at: template.created_at(),
            updated_at: template.updated_at(),
        }
    }

    /// Reconstructs the domain record.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when a stored value fails domain
    /// validation.
    pub fn into_domain(self) -> Result<TaskTemplate, ChallengeRepositoryError> {
        let weekdays = u8::try_from(self.weekdays)
            .ok()
            .and_then(|bits| crate::challenge::domain::WeekdayMask::new(bits).ok())
            .ok_or_else(|| corrupt_row("task_templates.weekdays", &self.weekdays.to_string()))?;
        let title =
            Title::new(self.title).map_err(ChallengeRepositoryError::persistence)?;
        Ok(TaskTemplate::from_persisted(PersistedTemplateData {
            id: TemplateId::from_uuid(self.id),
            challenge_id: ChallengeId::from_uuid(self.challenge_id),
            title,
            description: self.description,
            weekdays,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Query result row for task status records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusRow {
    /// Owning user.
    pub user_id: uuid::Uuid,
    /// Template the row was generated from.
    pub template_id: uuid::Uuid,
    /// Covered calendar day.
    pub date: NaiveDate,
    /// Completion state.
    pub status: String,
}

impl StatusRow {
    /// Builds a row from the domain record.
    #[must_use]
    pub fn from_domain(status: &TaskStatus) -> Self {
        Self {
            user_id: status.user_id().into_inner(),
            template_id: status.template_id().into_inner(),
            date: status.date(),
            status: status.completion().as_str().to_owned(),
        }
    }

    /// Reconstructs the domain record.
    ///
    /// # Errors
    ///
    /// Returns a persistence error for an unknown completion value.
    pub fn into_domain(self) -> Result<TaskStatus, ChallengeRepositoryError> {
        let completion = Completion::try_from(self.status.as_str())
            .map_err(ChallengeRepositoryError::persistence)?;
        Ok(TaskStatus::from_persisted(
            UserId::from_uuid(self.user_id),
            TemplateId::from_uuid(self.template_id),
            self.date,
            completion,
        ))
    }
}

fn corrupt_row(column: &str, value: &str) -> ChallengeRepositoryError {
    ChallengeRepositoryError::persistence(std::io::Error::other(format!(
        "corrupt {column} value: {value}"
    )))
}
