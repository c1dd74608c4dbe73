//! `PostgreSQL` adapter for challenge persistence.

mod models;
mod repository;
mod schema;

pub use repository::{ChallengePgPool, PostgresChallengeRepository};
