//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Event and snapshot fixtures
//! - Runtime helpers for paused-time tests
//! - Custom assertion macros

pub mod assertions;
pub mod fixtures;

pub use fixtures::*;
