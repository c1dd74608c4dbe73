//! Challenge lifecycle and daily task tracking.
//!
//! A challenge is a titled, time-boxed container of recurring task
//! templates, owned by exactly one user and joined by invited participants.
//! Starting a challenge fans the template set out into one task status row
//! per (member, template, matching day); accepting an invitation into a
//! started challenge repeats the fan-out for the new member alone. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
