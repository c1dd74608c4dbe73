//! Unit tests for the challenge module.
//!
//! Organised by layer: pure domain and calendar behaviour, the fan-out
//! generator, then one module per orchestration service.

mod membership_service_tests;
