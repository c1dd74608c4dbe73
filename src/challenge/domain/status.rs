//! Per-user, per-day task completion records.

use super::{
    error::ParseCompletionError,
    ids::{TemplateId, UserId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Completion state of a single task on a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Generated default; the member has not recorded anything yet.
    NotStarted,
    /// The member completed the task that day.
    Completed,
    /// The member explicitly marked the task not completed.
    NotCompleted,
}

impl Completion {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Completed => "completed",
            Self::NotCompleted => "not_completed",
        }
    }
}

impl TryFrom<&str> for Completion {
    type Error = ParseCompletionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "not_started" => Ok(Self::NotStarted),
            "completed" => Ok(Self::Completed),
            "not_completed" => Ok(Self::NotCompleted),
            _ => Err(ParseCompletionError(value.to_owned())),
        }
    }
}

/// A task status row, keyed by `(user, template, date)`.
///
/// Exactly one row exists per key where the template's mask covers the
/// date's weekday and the date lies in the challenge's active range. Rows
/// are created by the fan-out generator and only ever mutated by the owning
/// user, for the current day, while the challenge is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    user_id: UserId,
    template_id: TemplateId,
    date: NaiveDate,
    completion: Completion,
}

impl TaskStatus {
    /// Creates a freshly generated row in the not-started state.
    #[must_use]
    pub const fn fresh(user_id: UserId, template_id: TemplateId, date: NaiveDate) -> Self {
        Self {
            user_id,
            template_id,
            date,
            completion: Completion::NotStarted,
        }
    }

    /// Reconstructs a row from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        user_id: UserId,
        template_id: TemplateId,
        date: NaiveDate,
        completion: Completion,
    ) -> Self {
        Self {
            user_id,
            template_id,
            date,
            completion,
        }
    }

    /// Returns the owning user's identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the template the row was generated from.
    #[must_use]
    pub const fn template_id(&self) -> TemplateId {
        self.template_id
    }

    /// Returns the calendar day the row covers.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the recorded completion state.
    #[must_use]
    pub const fn completion(&self) -> Completion {
        self.completion
    }

    /// Overwrites the completion state.
    pub const fn record(&mut self, completion: Completion) {
        self.completion = completion;
    }
}
