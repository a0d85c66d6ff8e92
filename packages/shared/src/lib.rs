//! Shared utilities for the chanoma chat and agent-dispatch server.
//!
//! This crate holds the pieces every binary needs: logging setup and
//! time utilities with a clock abstraction for testability.

pub mod logger;
pub mod time;
