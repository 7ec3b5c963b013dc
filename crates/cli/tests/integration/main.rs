//! CLI integration tests.

mod common;
mod diff_tests;
mod pull_tests;
mod push_tests;
mod summary_tests;
