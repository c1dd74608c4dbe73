//! Recurring task templates and their weekly recurrence masks.

use super::{
    calendar::weekday_bit,
    challenge::Title,
    error::ChallengeDomainError,
    ids::{ChallengeId, TemplateId},
};
use chrono::{DateTime, Utc, Weekday};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Seven-bit set of active weekdays, with Sunday at bit zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    /// Mask with every weekday active.
    pub const EVERY_DAY: Self = Self(0b0111_1111);

    /// Creates a validated mask from raw bits.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeDomainError::EmptyWeekdayMask`] when no bit is set
    /// and [`ChallengeDomainError::WeekdayMaskOutOfRange`] when bits beyond
    /// the seven weekday positions are set.
    pub const fn new(bits: u8) -> Result<Self, ChallengeDomainError> {
        if bits == 0 {
            return Err(ChallengeDomainError::EmptyWeekdayMask);
        }
        if bits > Self::EVERY_DAY.0 {
            return Err(ChallengeDomainError::WeekdayMaskOutOfRange(bits));
        }
        Ok(Self(bits))
    }

    /// Creates a mask from a set of weekdays.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeDomainError::EmptyWeekdayMask`] when the iterator
    /// yields no weekdays.
    pub fn from_weekdays(
        weekdays: impl IntoIterator<Item = Weekday>,
    ) -> Result<Self, ChallengeDomainError> {
        let bits = weekdays
            .into_iter()
            .fold(0u8, |acc, day| acc | weekday_bit(day));
        Self::new(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns whether the given weekday is active.
    #[must_use]
    pub const fn contains(self, weekday: Weekday) -> bool {
        self.0 & weekday_bit(weekday) != 0
    }
}

/// A recurring unit of work attached to a challenge.
///
/// Active on the weekdays selected by its mask. The mask is frozen once the
/// challenge starts; title and description stay editable until it finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    id: TemplateId,
    challenge_id: ChallengeId,
    title: Title,
    description: String,
    weekdays: WeekdayMask,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTemplateData {
    /// Persisted template identifier.
    pub id: TemplateId,
    /// Challenge the template belongs to.
    pub challenge_id: ChallengeId,
    /// Persisted title.
    pub title: Title,
    /// Persisted description.
    pub description: String,
    /// Persisted weekday recurrence mask.
    pub weekdays: WeekdayMask,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskTemplate {
    /// Creates a new template for a challenge.
    #[must_use]
    pub fn new(
        challenge_id: ChallengeId,
        title: Title,
        description: impl Into<String>,
        weekdays: WeekdayMask,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TemplateId::new(),
            challenge_id,
            title,
            description: description.into(),
            weekdays,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a template from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTemplateData) -> Self {
        Self {
            id: data.id,
            challenge_id: data.challenge_id,
            title: data.title,
            description: data.description,
            weekdays: data.weekdays,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the template identifier.
    #[must_use]
    pub const fn id(&self) -> TemplateId {
        self.id
    }

    /// Returns the challenge the template belongs to.
    #[must_use]
    pub const fn challenge_id(&self) -> ChallengeId {
        self.challenge_id
    }

    /// Returns the template title.
    #[must_use]
    pub const fn title(&self) -> &Title {
        &self.title
    }

    /// Returns the template description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the weekday recurrence mask.
    #[must_use]
    pub const fn weekdays(&self) -> WeekdayMask {
        self.weekdays
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the title and description.
    pub fn edit(&mut self, title: Title, description: impl Into<String>, clock: &impl Clock) {
        self.title = title;
        self.description = description.into();
        self.touch(clock);
    }

    /// Replaces the weekday recurrence mask.
    ///
    /// Callers must reject mask changes once the owning challenge has
    /// started; the generated status rows would no longer match.
    pub fn reschedule(&mut self, weekdays: WeekdayMask, clock: &impl Clock) {
        self.weekdays = weekdays;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
