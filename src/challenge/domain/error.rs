//! Error types for challenge domain validation and parsing.

use super::challenge::ChallengeStatus;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned while constructing or validating domain values.
///
/// These are the validation-shaped failures of the error taxonomy: every
/// variant is detectable before any persistence attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChallengeDomainError {
    /// The challenge or template title is empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,

    /// The challenge duration lies outside the permitted range.
    #[error("days must be between 1 and {max}, got {got}")]
    InvalidDays {
        /// The rejected value.
        got: u8,
        /// Largest permitted duration.
        max: u8,
    },

    /// The weekday mask has no bits set.
    #[error("weekday mask must select at least one day")]
    EmptyWeekdayMask,

    /// The weekday mask sets bits outside the seven valid positions.
    #[error("weekday mask {0:#010b} sets bits outside the seven weekday positions")]
    WeekdayMaskOutOfRange(u8),

    /// A task status update targets a date other than the current day.
    #[error("task status may only be recorded for today ({today}), got {got}")]
    StatusDateNotToday {
        /// The rejected date.
        got: NaiveDate,
        /// The current day according to the service clock.
        today: NaiveDate,
    },

    /// A day range was constructed with `end` before `start`.
    #[error("day range end {end} precedes start {start}")]
    InvertedDayRange {
        /// Range start.
        start: NaiveDate,
        /// Range end.
        end: NaiveDate,
    },
}

/// Conflict raised when a lifecycle action is attempted from the wrong state.
///
/// Carries the attempted action verb for the caller-facing message, e.g.
/// "cannot start a started challenge".
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot {action} a {status} challenge")]
pub struct StateTransitionError {
    /// The verb describing the rejected action.
    pub action: &'static str,
    /// The challenge status that rejected it.
    pub status: ChallengeStatus,
}

impl StateTransitionError {
    /// Creates a transition conflict for the given action and state.
    #[must_use]
    pub const fn new(action: &'static str, status: ChallengeStatus) -> Self {
        Self { action, status }
    }
}

/// Error returned while parsing challenge statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown challenge status: {0}")]
pub struct ParseChallengeStatusError(pub String);

/// Error returned while parsing member roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown member role: {0}")]
pub struct ParseMemberRoleError(pub String);

/// Error returned while parsing invitation statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown invitation status: {0}")]
pub struct ParseInvitationStatusError(pub String);

/// Error returned while parsing task completion states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task completion state: {0}")]
pub struct ParseCompletionError(pub String);
