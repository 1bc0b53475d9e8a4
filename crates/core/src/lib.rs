//! # Avala Core
//!
//! Domain types, traits, and error definitions for the Avala agents SDK.
//! This crate has **zero transport dependencies** — it defines the domain
//! model that the client and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is a trait here. The HTTP implementation lives in
//! `avala-client`, the polling loop in `avala-agent`. This enables:
//! - Testing the dispatch/polling machinery against mock implementations
//! - Swapping the transport without touching agent code
//! - A clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod api;
pub mod context;
pub mod error;
pub mod event;
pub mod execution;
pub mod handler;

// Re-export key types at crate root for ergonomics
pub use action::Action;
pub use api::{ActionSink, AgentRegistration, ExecutionFilters, PlatformApi};
pub use context::{Context, EventContext, ResultContext, TaskContext};
pub use error::{ActionError, Error, RegistrationError, Result};
pub use event::{AGENT_EVENTS, AgentEvent, EventCategory};
pub use execution::Execution;
pub use handler::{EventHandler, FnHandler};
