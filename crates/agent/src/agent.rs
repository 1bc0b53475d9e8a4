//! `TaskAgent` — main entry point for the SDK.
//!
//! The agent owns the handler table and the platform client, registers
//! itself with the server before polling, and dispatches fetched
//! executions to the matching handlers.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, info, warn};

use avala_client::AvalaClient;
use avala_core::action::Action;
use avala_core::api::{ActionSink, AgentRegistration, ExecutionFilters, PlatformApi};
use avala_core::context::Context;
use avala_core::error::{Error, Result};
use avala_core::event::{AGENT_EVENTS, AgentEvent, is_recognized};
use avala_core::execution::Execution;
use avala_core::handler::{EventHandler, FnHandler};

use crate::registry::HandlerRegistry;
use crate::runner::{PollingRunner, StopHandle};

const DEFAULT_NAME: &str = "default-agent";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// An agent that processes annotation workflow events.
///
/// The agent polls the Avala API for pending executions, calls the
/// matching handler, and the handler submits its decision back to the
/// platform through the context it receives.
pub struct TaskAgent {
    name: String,
    filters: ExecutionFilters,
    poll_interval: Duration,
    client: Arc<dyn PlatformApi>,
    handlers: HandlerRegistry,
    agent_uid: Option<String>,
    stop: Arc<AtomicBool>,
}

impl std::fmt::Debug for TaskAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskAgent")
            .field("name", &self.name)
            .field("filters", &self.filters)
            .field("poll_interval", &self.poll_interval)
            .field("agent_uid", &self.agent_uid)
            .finish_non_exhaustive()
    }
}

impl TaskAgent {
    /// Create an agent backed by the hosted Avala API with an explicit
    /// API key (`avk_...`).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Config {
                message: "No API key provided. Pass an api_key or set the \
                          AVALA_API_KEY environment variable."
                    .into(),
            });
        }
        Ok(Self::with_client(Arc::new(AvalaClient::new(api_key))))
    }

    /// Create an agent from the `AVALA_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_client(Arc::new(AvalaClient::from_env()?)))
    }

    /// Create an agent over any `PlatformApi` implementation.
    pub fn with_client(client: Arc<dyn PlatformApi>) -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            filters: ExecutionFilters::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            client,
            handlers: HandlerRegistry::new(),
            agent_uid: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Logical name for this agent instance, shown in the dashboard.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Only receive executions belonging to this project.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.filters.project = Some(project.into());
        self
    }

    /// Only receive executions for these task types.
    pub fn with_task_types(mut self, task_types: Vec<String>) -> Self {
        self.filters.task_types = task_types;
        self
    }

    /// Time to wait between polls when the queue is empty (default 5s).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The server-assigned agent uid, once registered.
    pub fn agent_uid(&self) -> Option<&str> {
        self.agent_uid.as_deref()
    }

    /// A clonable handle that stops the polling loop after the
    /// in-flight cycle completes.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.stop.clone())
    }

    /// Register a handler for an event identifier.
    ///
    /// Re-registering an identifier silently replaces the earlier
    /// handler. Identifiers outside [`AGENT_EVENTS`] are rejected.
    pub fn on<H>(&mut self, event: &str, handler: H) -> Result<()>
    where
        H: EventHandler + 'static,
    {
        if !is_recognized(event) {
            return Err(Error::UnknownEvent {
                event: event.to_string(),
                supported: AGENT_EVENTS.join(", "),
            });
        }
        debug!(event = %event, "Registered handler");
        self.handlers.register(event, Arc::new(handler));
        Ok(())
    }

    /// Register an async closure as the handler for an event identifier.
    pub fn on_fn<F, Fut>(&mut self, event: &str, func: F) -> Result<()>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on(event, FnHandler::new(func))
    }

    /// Start the blocking polling loop.
    ///
    /// Registers the agent with the server on first call, then polls
    /// indefinitely for pending executions. Interrupt with Ctrl-C or a
    /// [`StopHandle`].
    pub async fn run(&mut self) -> Result<()> {
        self.register().await?;
        let runner =
            PollingRunner::with_stop_flag(&*self, self.poll_interval, self.stop.clone());
        runner.run().await;
        Ok(())
    }

    /// Process all currently pending executions once and return.
    ///
    /// Registers the agent with the server if not already registered.
    /// Returns the number of executions processed.
    pub async fn run_once(&mut self) -> Result<usize> {
        self.register().await?;
        let runner =
            PollingRunner::with_stop_flag(&*self, self.poll_interval, self.stop.clone());
        Ok(runner.run_once().await)
    }

    /// Register (or update) this agent on the server.
    ///
    /// Idempotent within a process lifetime — the first success caches
    /// the assigned uid and later calls issue no request.
    pub async fn register(&mut self) -> Result<()> {
        if self.agent_uid.is_some() {
            return Ok(()); // Already registered in this session.
        }

        let registration = AgentRegistration {
            name: self.name.clone(),
            events: self.handlers.events(),
            project: self.filters.project.clone(),
            task_types: self.filters.task_types.clone(),
        };
        let agent_uid = self.client.register_agent(&registration).await?;
        info!(agent = %self.name, uid = %agent_uid, "Agent registered");
        self.agent_uid = Some(agent_uid);
        Ok(())
    }

    /// Poll the server for pending executions assigned to this agent.
    ///
    /// Never fails: fetch errors are logged and surface as an empty
    /// batch, as does fetching before registration.
    pub(crate) async fn fetch_pending(&self) -> Vec<Execution> {
        let Some(agent_uid) = &self.agent_uid else {
            warn!("Cannot fetch executions — agent not registered");
            return Vec::new();
        };

        match self
            .client
            .fetch_pending_executions(agent_uid, &self.filters)
            .await
        {
            Ok(batch) => batch,
            Err(error) => {
                tracing::error!(error = %error, "Failed to fetch pending executions");
                Vec::new()
            }
        }
    }

    /// Dispatch a single execution to its registered handler.
    ///
    /// Unhandled event types are skipped automatically without touching
    /// user code. When a handler runs, the execution's fate is entirely
    /// its responsibility; a handler error or panic is returned to the
    /// runner as the item's failure.
    pub(crate) async fn dispatch(&self, execution: Execution) -> Result<()> {
        let event = AgentEvent {
            execution_uid: execution.uid,
            event_type: execution.event_type,
            payload: execution.event_payload,
        };

        let Some(handler) = self.handlers.get(&event.event_type) else {
            let reason = format!(
                "No handler registered for event type '{}'",
                event.event_type
            );
            warn!(
                event_type = %event.event_type,
                execution = %event.execution_uid,
                "No handler for event — skipping"
            );
            return self
                .client
                .submit_action(&event.execution_uid, Action::Skip, &reason)
                .await;
        };

        debug!(
            execution = %event.execution_uid,
            event_type = %event.event_type,
            "Dispatching execution to handler"
        );
        let context = Context::from_event(event, self.action_sink());

        match AssertUnwindSafe(handler.handle(context)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(Error::Handler(panic_message(panic.as_ref()))),
        }
    }

    /// Submit a skip for an execution the runner failed to dispatch.
    pub(crate) async fn submit_skip(&self, execution_uid: &str, reason: &str) -> Result<()> {
        self.client
            .submit_action(execution_uid, Action::Skip, reason)
            .await
    }

    fn action_sink(&self) -> Arc<dyn ActionSink> {
        self.client.clone()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
