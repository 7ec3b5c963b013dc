//! Library integration tests.

mod common;
mod remote_tests;
mod workflow_tests;
