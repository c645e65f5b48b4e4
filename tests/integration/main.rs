//! Integration test modules.

mod monitor_test;
