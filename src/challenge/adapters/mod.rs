//! Adapter implementations of the challenge ports.

pub mod memory;
pub mod postgres;
