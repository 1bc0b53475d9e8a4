//! Shared test doubles for the agent crates.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use avala_core::action::Action;
use avala_core::api::{ActionSink, AgentRegistration, ExecutionFilters, PlatformApi};
use avala_core::error::{ActionError, RegistrationError, Result};
use avala_core::execution::Execution;

/// One recorded `submit_action` call.
#[derive(Debug, Clone)]
pub(crate) struct SubmittedAction {
    pub execution_uid: String,
    pub action: Action,
    pub reason: String,
}

/// In-memory `PlatformApi` recording every call it receives.
///
/// Fetch responses are scripted up front with [`MockApi::with_batches`];
/// once the script is exhausted further fetches return empty batches.
#[derive(Default)]
pub(crate) struct MockApi {
    pub register_calls: AtomicUsize,
    pub registrations: Mutex<Vec<AgentRegistration>>,
    pub fail_register: bool,
    pub batches: Mutex<VecDeque<Result<Vec<Execution>>>>,
    pub actions: Mutex<Vec<SubmittedAction>>,
    pub fail_actions: AtomicBool,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_batches(batches: Vec<Result<Vec<Execution>>>) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(batches.into()),
            ..Self::default()
        })
    }

    /// Every action submitted so far, in call order.
    pub fn actions(&self) -> Vec<SubmittedAction> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionSink for MockApi {
    async fn submit_action(&self, execution_uid: &str, action: Action, reason: &str) -> Result<()> {
        // Record the attempt even when scripted to fail, so tests can
        // observe what was sent.
        self.actions.lock().unwrap().push(SubmittedAction {
            execution_uid: execution_uid.to_string(),
            action,
            reason: reason.to_string(),
        });
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(ActionError::Rejected {
                status_code: 500,
                message: "scripted action failure".into(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformApi for MockApi {
    async fn register_agent(&self, registration: &AgentRegistration) -> Result<String> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.registrations.lock().unwrap().push(registration.clone());
        if self.fail_register {
            return Err(RegistrationError::Rejected {
                status_code: 500,
                message: "scripted registration failure".into(),
            }
            .into());
        }
        Ok("agent-123".to_string())
    }

    async fn fetch_pending_executions(
        &self,
        _agent_uid: &str,
        _filters: &ExecutionFilters,
    ) -> Result<Vec<Execution>> {
        match self.batches.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(Vec::new()),
        }
    }
}

/// Build an execution fixture.
pub(crate) fn execution(uid: &str, event_type: &str, payload: Value) -> Execution {
    Execution {
        uid: uid.to_string(),
        event_type: event_type.to_string(),
        event_payload: payload.as_object().cloned().unwrap_or_default(),
    }
}
