//! Core domain for the triage support backend.
//!
//! This crate holds everything the rest of the workspace agrees on and
//! nothing that performs I/O:
//! - domain records (conversations, messages, orders, invoices)
//! - the `Intent` enumeration and its normalization rules
//! - the agent catalog: one immutable profile (system prompt + tool
//!   subset) per intent
//! - configuration loading and the layered error taxonomy
//!
//! The routing decision space is closed by construction: the router can
//! only produce an `Intent`, and `AgentCatalog::profile_for` matches
//! exhaustively over it, so every reachable agent and tool binding is
//! checkable at compile time.

pub mod agents;
pub mod config;
pub mod domain;
pub mod errors;
pub mod intent;

pub use agents::{AgentCatalog, AgentProfile};
pub use intent::Intent;
