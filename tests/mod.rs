//! Test suite for informer-sync
//!
//! This module organizes all tests

pub mod common;
pub mod integration;
pub mod property;
