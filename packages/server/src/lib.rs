//! Room-based realtime chat and agent-dispatch server.
//!
//! This crate implements the chanoma server: persistent bidirectional
//! client connections partitioned into rooms, per-room state (participants,
//! chat history, a poker ledger), fan-out of events in receipt order, and
//! coordination of an external conversational agent per caller identity.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
