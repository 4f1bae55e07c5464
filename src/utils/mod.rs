//! Pure utility functions and task plumbing.
//!
//! These are helpers used across the codebase.

pub mod bootstrap;
pub mod retry;
pub mod task;
pub mod time;
