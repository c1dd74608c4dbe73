//! Rygoal: multi-day challenge tracking core.
//!
//! This crate implements the domain core of a challenge tracking service:
//! titled, time-boxed challenges carrying recurring task templates, the
//! memberships and invitations binding users to them, and the per-user,
//! per-day completion records generated when a challenge starts or a new
//! member joins.
//!
//! # Architecture
//!
//! Rygoal follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, tests)
//!
//! # Modules
//!
//! - [`challenge`]: Challenge lifecycle, membership, task templates, and
//!   daily task status generation

pub mod challenge;
