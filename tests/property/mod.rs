//! Property-based tests

pub mod tracker_proptest;
