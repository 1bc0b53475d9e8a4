//! Event taxonomy — the catalog of recognised event identifiers.
//!
//! Identifiers outside the catalog are legal: the server may introduce
//! new event types at any time, and the SDK handles them through the
//! generic context path rather than erroring.

use serde_json::{Map, Value};

/// All event identifiers the agent framework can handle.
/// Must stay in sync with the server's agent event constants.
pub const AGENT_EVENTS: [&str; 9] = [
    "dataset.created",
    "dataset.updated",
    "dataset.deleted",
    "export.completed",
    "export.failed",
    "task.completed",
    "result.submitted",
    "result.accepted",
    "result.rejected",
];

/// The payload category an event identifier belongs to.
///
/// Every recognised identifier maps to exactly one category; anything
/// else maps to none and falls through to the generic context shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    /// Carries task + annotation result data.
    Result,
    /// Carries task status data.
    Task,
    /// Carries a dataset resource reference.
    Dataset,
    /// Carries an export resource reference.
    Export,
}

impl EventCategory {
    /// Look up the category of an event identifier. Pure table lookup;
    /// `None` means the identifier is unrecognised, not invalid.
    pub fn of(event_type: &str) -> Option<Self> {
        match event_type {
            "result.submitted" | "result.accepted" | "result.rejected" => Some(Self::Result),
            "task.completed" => Some(Self::Task),
            "dataset.created" | "dataset.updated" | "dataset.deleted" => Some(Self::Dataset),
            "export.completed" | "export.failed" => Some(Self::Export),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Result => "result",
            Self::Task => "task",
            Self::Dataset => "dataset",
            Self::Export => "export",
        }
    }
}

/// Whether an event identifier is part of the recognised catalog.
pub fn is_recognized(event_type: &str) -> bool {
    EventCategory::of(event_type).is_some()
}

/// Raw event extracted from an execution record, before a typed
/// context is built from it.
#[derive(Debug, Clone)]
pub struct AgentEvent {
    pub execution_uid: String,
    pub event_type: String,
    pub payload: Map<String, Value>,
}
