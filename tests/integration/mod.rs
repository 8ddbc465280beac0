//! Integration tests across module boundaries

pub mod config_test;
pub mod informer_watch_test;
pub mod monitor_test;
