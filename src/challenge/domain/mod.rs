//! Domain model for challenge tracking.
//!
//! The challenge domain models the DRAFT → STARTED → FINISHED lifecycle,
//! memberships and invitations, weekly-recurring task templates, and the
//! per-user, per-day status records generated from them, while keeping all
//! infrastructure concerns outside of the domain boundary.

mod calendar;
mod challenge;
mod error;
mod generator;
mod ids;
mod membership;
mod status;
mod template;

pub use calendar::{DayRange, day_of, weekday_bit};
pub use challenge::{Challenge, ChallengeStatus, DurationDays, PersistedChallengeData, Title};
pub use error::{
    ChallengeDomainError, ParseChallengeStatusError, ParseCompletionError,
    ParseInvitationStatusError, ParseMemberRoleError, StateTransitionError,
};
pub use generator::generate_statuses;
pub use ids::{ChallengeId, TemplateId, UserId};
pub use membership::{Invitation, InvitationStatus, MemberRole, Membership};
pub use status::{Completion, TaskStatus};
pub use template::{PersistedTemplateData, TaskTemplate, WeekdayMask};
