//! Shared utilities.
//!
//! Content addressing for artifacts and compiled contracts.

pub mod hash;
