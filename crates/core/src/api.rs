//! Platform API traits — the seams between the agent machinery and the
//! HTTP transport.
//!
//! `ActionSink` is deliberately narrow: it is the capability handle a
//! context carries, exposing only "submit a decision for execution X".
//! `PlatformApi` is the full collaborator surface the agent needs.

use async_trait::async_trait;
use serde::Serialize;

use crate::action::Action;
use crate::error::Result;
use crate::execution::Execution;

/// Registration payload sent when the agent announces itself.
///
/// `project` and `task_types` are omitted from the wire body when
/// unset/empty.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRegistration {
    pub name: String,
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_types: Vec<String>,
}

/// Server-side filters applied when fetching pending executions.
#[derive(Debug, Clone, Default)]
pub struct ExecutionFilters {
    /// Restrict to executions belonging to this project.
    pub project: Option<String>,
    /// Restrict to these task type identifiers.
    pub task_types: Vec<String>,
}

/// The only side-effecting write path contexts may use: submit one
/// terminal decision for one execution.
#[async_trait]
pub trait ActionSink: Send + Sync {
    /// Submit `action` for `execution_uid`. An empty `reason` is
    /// omitted from the request body entirely.
    async fn submit_action(&self, execution_uid: &str, action: Action, reason: &str)
    -> Result<()>;
}

/// The full collaborator service surface consumed by the agent.
#[async_trait]
pub trait PlatformApi: ActionSink {
    /// Register (or update) the agent; returns the assigned agent uid
    /// used for all subsequent fetch calls.
    async fn register_agent(&self, registration: &AgentRegistration) -> Result<String>;

    /// Fetch the current batch of pending executions for this agent.
    async fn fetch_pending_executions(
        &self,
        agent_uid: &str,
        filters: &ExecutionFilters,
    ) -> Result<Vec<Execution>>;
}
