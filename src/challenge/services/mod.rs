//! Application services for challenge tracking.
//!
//! Each service orchestrates domain logic over the repository port; the
//! shared error type in [`error`] carries the caller-facing taxonomy
//! (validation, not-found, forbidden, conflict, invalid-token) and
//! [`access`] centralizes the role checks every operation goes through.

mod access;
mod error;
mod lifecycle;
mod membership;
mod status;
mod template;
mod token;

pub use error::{ChallengeServiceError, ChallengeServiceResult};
pub use lifecycle::{ChallengeLifecycleService, CreateChallengeRequest, UpdateChallengeRequest};
pub use membership::{InviteUserRequest, MembershipService};
pub use status::{TaskStatusService, TemplateWithStatus, UpdateTaskStatusRequest};
pub use template::{CreateTemplateRequest, TaskTemplateService, UpdateTemplateRequest};
pub use token::{InvitationClaims, InvitationTokenError, InvitationTokenService};
