//! Challenge aggregate root and lifecycle state machine.

use super::{
    DayRange,
    error::{ChallengeDomainError, ParseChallengeStatusError, StateTransitionError},
    ids::ChallengeId,
};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Challenge lifecycle state.
///
/// Transitions are strictly forward: `Draft` → `Started` → `Finished`. No
/// transition skips a state and none reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Challenge is being assembled; templates and dates are still open.
    Draft,
    /// Challenge is running and status rows exist for its members.
    Started,
    /// Challenge has ended; all records are read-only history.
    Finished,
}

impl ChallengeStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }

    /// Returns whether the status permits any further lifecycle action.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ChallengeStatus {
    type Error = ParseChallengeStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "started" => Ok(Self::Started),
            "finished" => Ok(Self::Finished),
            _ => Err(ParseChallengeStatusError(value.to_owned())),
        }
    }
}

/// Validated challenge duration in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationDays(u8);

impl DurationDays {
    /// Longest supported challenge duration.
    pub const MAX: u8 = 7;

    /// Creates a validated duration.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeDomainError::InvalidDays`] when the value is zero
    /// or exceeds [`Self::MAX`].
    pub const fn new(value: u8) -> Result<Self, ChallengeDomainError> {
        if value == 0 || value > Self::MAX {
            return Err(ChallengeDomainError::InvalidDays {
                got: value,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Returns the underlying number of days.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Validated non-empty title for challenges and task templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeDomainError::EmptyTitle`] when the value is empty
    /// or whitespace-only.
    pub fn new(value: impl Into<String>) -> Result<Self, ChallengeDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ChallengeDomainError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Challenge aggregate root.
///
/// Start and end dates are unset while the challenge is in draft. They are
/// computed exactly once when the challenge starts and never recomputed:
/// `end_date = start_date + days`, with the active range half-open at the
/// end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    id: ChallengeId,
    title: Title,
    description: String,
    status: ChallengeStatus,
    days: DurationDays,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted challenge aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedChallengeData {
    /// Persisted challenge identifier.
    pub id: ChallengeId,
    /// Persisted title.
    pub title: Title,
    /// Persisted description.
    pub description: String,
    /// Persisted lifecycle status.
    pub status: ChallengeStatus,
    /// Persisted duration.
    pub days: DurationDays,
    /// Persisted start date, if the challenge has started.
    pub start_date: Option<NaiveDate>,
    /// Persisted exclusive end date, if the challenge has started.
    pub end_date: Option<NaiveDate>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    /// Creates a new draft challenge.
    #[must_use]
    pub fn new(
        title: Title,
        description: impl Into<String>,
        days: DurationDays,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ChallengeId::new(),
            title,
            description: description.into(),
            status: ChallengeStatus::Draft,
            days,
            start_date: None,
            end_date: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a challenge from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedChallengeData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            days: data.days,
            start_date: data.start_date,
            end_date: data.end_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the challenge identifier.
    #[must_use]
    pub const fn id(&self) -> ChallengeId {
        self.id
    }

    /// Returns the challenge title.
    #[must_use]
    pub const fn title(&self) -> &Title {
        &self.title
    }

    /// Returns the challenge description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ChallengeStatus {
        self.status
    }

    /// Returns the challenge duration.
    #[must_use]
    pub const fn days(&self) -> DurationDays {
        self.days
    }

    /// Returns the start date, set once the challenge has started.
    #[must_use]
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Returns the exclusive end date, set once the challenge has started.
    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the active day range `[start_date, end_date)`.
    ///
    /// `None` while the challenge is in draft.
    #[must_use]
    pub fn active_range(&self) -> Option<DayRange> {
        let start = self.start_date?;
        Some(DayRange::from_start_and_days(start, self.days.value()))
    }

    /// Starts the challenge on the given day.
    ///
    /// Sets `start_date` to `today` and `end_date` to `today + days`.
    ///
    /// # Errors
    ///
    /// Returns [`StateTransitionError`] unless the challenge is in draft.
    pub fn start(
        &mut self,
        today: NaiveDate,
        clock: &impl Clock,
    ) -> Result<(), StateTransitionError> {
        self.require_status(ChallengeStatus::Draft, "start")?;
        let range = DayRange::from_start_and_days(today, self.days.value());
        self.start_date = Some(range.start());
        self.end_date = Some(range.end());
        self.status = ChallengeStatus::Started;
        self.touch(clock);
        Ok(())
    }

    /// Finishes the challenge.
    ///
    /// Existing task status rows are untouched and remain as history.
    ///
    /// # Errors
    ///
    /// Returns [`StateTransitionError`] unless the challenge has started.
    pub fn finish(&mut self, clock: &impl Clock) -> Result<(), StateTransitionError> {
        self.require_status(ChallengeStatus::Started, "finish")?;
        self.status = ChallengeStatus::Finished;
        self.touch(clock);
        Ok(())
    }

    /// Replaces the title and description.
    ///
    /// # Errors
    ///
    /// Returns [`StateTransitionError`] unless the challenge is in draft;
    /// details are frozen once the date range is fixed.
    pub fn edit(
        &mut self,
        title: Title,
        description: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), StateTransitionError> {
        self.require_status(ChallengeStatus::Draft, "update")?;
        self.title = title;
        self.description = description.into();
        self.touch(clock);
        Ok(())
    }

    /// Confirms the challenge may be deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StateTransitionError`] unless the challenge is in draft.
    pub fn ensure_deletable(&self) -> Result<(), StateTransitionError> {
        self.require_status(ChallengeStatus::Draft, "delete")
    }

    fn require_status(
        &self,
        expected: ChallengeStatus,
        action: &'static str,
    ) -> Result<(), StateTransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(StateTransitionError::new(action, self.status))
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
