//! Context objects handed to agent event handlers.
//!
//! A context is an immutable, read-only view over one execution's
//! payload, shaped by the event's category. It carries an `ActionSink`
//! handle purely to submit a decision back to the platform — it does
//! not own the execution.
//!
//! The three shapes are modelled as one sum type selected once at
//! construction time by the category lookup, so each variant's required
//! fields stay total instead of a pile of optionals.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::action::Action;
use crate::api::ActionSink;
use crate::error::Result;
use crate::event::{AgentEvent, EventCategory};

/// The per-category view handed to a registered handler.
#[derive(Clone)]
pub enum Context {
    /// Result events — `result.submitted` / `result.accepted` /
    /// `result.rejected`.
    Result(ResultContext),
    /// Task events — `task.completed`.
    Task(TaskContext),
    /// Dataset/export events, and the generic fallback for event types
    /// this SDK version does not recognise.
    Event(EventContext),
}

impl Context {
    /// Build the context for `event`, selecting the shape by category.
    ///
    /// Evaluated in fixed priority order: result → task →
    /// dataset/export → generic fallback. The fallback path is total —
    /// an unrecognised event type never fails, so new server-side
    /// events degrade gracefully instead of requiring an SDK update.
    pub fn from_event(event: AgentEvent, sink: Arc<dyn ActionSink>) -> Self {
        let AgentEvent {
            execution_uid,
            event_type,
            payload,
        } = event;

        match EventCategory::of(&event_type) {
            Some(EventCategory::Result) => Self::Result(ResultContext {
                execution_uid,
                event_type,
                task_uid: required_str(&payload, "task_uid"),
                result_uid: required_str(&payload, "result_uid"),
                result_data: payload
                    .get("result_data")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                result_metadata: payload
                    .get("result_metadata")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default(),
                task_name: optional_str(&payload, "task_name"),
                task_type: optional_str(&payload, "task_type"),
                project_uid: optional_str(&payload, "project_uid"),
                sink,
            }),
            Some(EventCategory::Task) => Self::Task(TaskContext {
                execution_uid,
                event_type,
                task_uid: required_str(&payload, "task_uid"),
                task_name: optional_str(&payload, "task_name"),
                task_type: optional_str(&payload, "task_type"),
                task_status: optional_str(&payload, "task_status"),
                project_uid: optional_str(&payload, "project_uid"),
                sink,
            }),
            Some(EventCategory::Dataset) | Some(EventCategory::Export) => {
                let resource_uid =
                    optional_str(&payload, "dataset_uid").or_else(|| optional_str(&payload, "export_uid"));
                // The category name is the identifier's leading segment,
                // e.g. "dataset" from "dataset.created".
                let resource_type = event_type.split('.').next().unwrap_or_default().to_string();
                Self::Event(EventContext {
                    execution_uid,
                    event_type,
                    resource_uid,
                    resource_type: Some(resource_type),
                    project_uid: optional_str(&payload, "project_uid"),
                    payload,
                    sink,
                })
            }
            None => Self::Event(EventContext {
                execution_uid,
                event_type,
                resource_uid: None,
                resource_type: None,
                project_uid: optional_str(&payload, "project_uid"),
                payload,
                sink,
            }),
        }
    }

    /// UID of the execution this context was built for.
    pub fn execution_uid(&self) -> &str {
        match self {
            Self::Result(ctx) => &ctx.execution_uid,
            Self::Task(ctx) => &ctx.execution_uid,
            Self::Event(ctx) => &ctx.execution_uid,
        }
    }

    /// The event identifier that produced this context.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Result(ctx) => &ctx.event_type,
            Self::Task(ctx) => &ctx.event_type,
            Self::Event(ctx) => &ctx.event_type,
        }
    }

    fn sink(&self) -> &Arc<dyn ActionSink> {
        match self {
            Self::Result(ctx) => &ctx.sink,
            Self::Task(ctx) => &ctx.sink,
            Self::Event(ctx) => &ctx.sink,
        }
    }

    /// Approve this execution.
    pub async fn approve(&self, reason: &str) -> Result<()> {
        self.sink()
            .submit_action(self.execution_uid(), Action::Approve, reason)
            .await
    }

    /// Reject this execution.
    pub async fn reject(&self, reason: &str) -> Result<()> {
        self.sink()
            .submit_action(self.execution_uid(), Action::Reject, reason)
            .await
    }

    /// Flag this execution for manual review.
    pub async fn flag(&self, reason: &str) -> Result<()> {
        self.sink()
            .submit_action(self.execution_uid(), Action::Flag, reason)
            .await
    }

    /// Acknowledge the execution without taking any workflow action.
    /// Skip never carries a reason.
    pub async fn skip(&self) -> Result<()> {
        self.sink()
            .submit_action(self.execution_uid(), Action::Skip, "")
            .await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Result(ctx) => ctx.fmt(f),
            Self::Task(ctx) => ctx.fmt(f),
            Self::Event(ctx) => ctx.fmt(f),
        }
    }
}

/// Context for result events — carries the annotation result under
/// review plus action methods to submit a decision.
#[derive(Clone)]
pub struct ResultContext {
    pub execution_uid: String,
    pub event_type: String,
    pub task_uid: String,
    pub result_uid: String,
    pub result_data: Vec<Value>,
    pub result_metadata: Map<String, Value>,
    pub task_name: Option<String>,
    pub task_type: Option<String>,
    pub project_uid: Option<String>,
    sink: Arc<dyn ActionSink>,
}

impl ResultContext {
    /// Approve this result and advance it through the workflow.
    pub async fn approve(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Approve, reason)
            .await
    }

    /// Reject this result, returning it to the annotator for correction.
    pub async fn reject(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Reject, reason)
            .await
    }

    /// Flag this result for manual human review.
    pub async fn flag(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Flag, reason)
            .await
    }

    /// Acknowledge the execution without taking any workflow action.
    pub async fn skip(&self) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Skip, "")
            .await
    }
}

impl std::fmt::Debug for ResultContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultContext")
            .field("execution_uid", &self.execution_uid)
            .field("event_type", &self.event_type)
            .field("task_uid", &self.task_uid)
            .field("result_uid", &self.result_uid)
            .field("result_data", &self.result_data)
            .field("result_metadata", &self.result_metadata)
            .field("task_name", &self.task_name)
            .field("task_type", &self.task_type)
            .field("project_uid", &self.project_uid)
            .finish()
    }
}

/// Context for task events — carries the task state.
#[derive(Clone)]
pub struct TaskContext {
    pub execution_uid: String,
    pub event_type: String,
    pub task_uid: String,
    pub task_name: Option<String>,
    pub task_type: Option<String>,
    pub task_status: Option<String>,
    pub project_uid: Option<String>,
    sink: Arc<dyn ActionSink>,
}

impl TaskContext {
    /// Approve this task execution.
    pub async fn approve(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Approve, reason)
            .await
    }

    /// Reject this task execution.
    pub async fn reject(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Reject, reason)
            .await
    }

    /// Flag this task execution for manual review.
    pub async fn flag(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Flag, reason)
            .await
    }

    /// Acknowledge the execution without taking any workflow action.
    pub async fn skip(&self) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Skip, "")
            .await
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("execution_uid", &self.execution_uid)
            .field("event_type", &self.event_type)
            .field("task_uid", &self.task_uid)
            .field("task_name", &self.task_name)
            .field("task_type", &self.task_type)
            .field("task_status", &self.task_status)
            .field("project_uid", &self.project_uid)
            .finish()
    }
}

/// Context for dataset/export events and for unrecognised event types.
///
/// Carries resource-level metadata plus the full payload verbatim for
/// handler inspection. For unrecognised event types both `resource_uid`
/// and `resource_type` are `None`.
#[derive(Clone)]
pub struct EventContext {
    pub execution_uid: String,
    pub event_type: String,
    pub resource_uid: Option<String>,
    pub resource_type: Option<String>,
    pub project_uid: Option<String>,
    pub payload: Map<String, Value>,
    sink: Arc<dyn ActionSink>,
}

impl EventContext {
    /// Approve this event execution.
    pub async fn approve(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Approve, reason)
            .await
    }

    /// Reject this event execution.
    pub async fn reject(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Reject, reason)
            .await
    }

    /// Flag this event execution for manual review.
    pub async fn flag(&self, reason: &str) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Flag, reason)
            .await
    }

    /// Acknowledge the execution without taking any workflow action.
    pub async fn skip(&self) -> Result<()> {
        self.sink
            .submit_action(&self.execution_uid, Action::Skip, "")
            .await
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("execution_uid", &self.execution_uid)
            .field("event_type", &self.event_type)
            .field("resource_uid", &self.resource_uid)
            .field("resource_type", &self.resource_type)
            .field("project_uid", &self.project_uid)
            .field("payload", &self.payload)
            .finish()
    }
}

fn required_str(payload: &Map<String, Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn optional_str(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every submitted action for assertions.
    struct RecordingSink {
        submissions: Mutex<Vec<(String, Action, String)>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                submissions: Mutex::new(Vec::new()),
            })
        }

        fn submissions(&self) -> Vec<(String, Action, String)> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionSink for RecordingSink {
        async fn submit_action(
            &self,
            execution_uid: &str,
            action: Action,
            reason: &str,
        ) -> std::result::Result<(), Error> {
            self.submissions.lock().unwrap().push((
                execution_uid.to_string(),
                action,
                reason.to_string(),
            ));
            Ok(())
        }
    }

    fn payload_of(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn event(event_type: &str, payload: Value) -> AgentEvent {
        AgentEvent {
            execution_uid: "exec-1".into(),
            event_type: event_type.into(),
            payload: payload_of(payload),
        }
    }

    #[test]
    fn result_event_builds_result_context() {
        let ctx = Context::from_event(
            event(
                "result.submitted",
                json!({
                    "task_uid": "t1",
                    "result_uid": "r1",
                    "result_data": [{"label": "car", "bbox": [10, 20, 100, 200]}],
                    "result_metadata": {"confidence": 0.95},
                    "project_uid": "p1",
                }),
            ),
            RecordingSink::new(),
        );
        let Context::Result(ctx) = ctx else {
            panic!("expected a result context");
        };
        assert_eq!(ctx.task_uid, "t1");
        assert_eq!(ctx.result_uid, "r1");
        assert_eq!(ctx.result_data.len(), 1);
        assert_eq!(ctx.result_metadata["confidence"], 0.95);
        assert_eq!(ctx.project_uid.as_deref(), Some("p1"));
        assert_eq!(ctx.task_name, None);
    }

    #[test]
    fn result_context_defaults_when_payload_sparse() {
        let ctx = Context::from_event(event("result.accepted", json!({})), RecordingSink::new());
        let Context::Result(ctx) = ctx else {
            panic!("expected a result context");
        };
        assert_eq!(ctx.task_uid, "");
        assert_eq!(ctx.result_uid, "");
        assert!(ctx.result_data.is_empty());
        assert!(ctx.result_metadata.is_empty());
        assert_eq!(ctx.project_uid, None);
    }

    #[test]
    fn task_event_builds_task_context() {
        let ctx = Context::from_event(
            event(
                "task.completed",
                json!({"task_uid": "t1", "task_status": "completed"}),
            ),
            RecordingSink::new(),
        );
        let Context::Task(ctx) = ctx else {
            panic!("expected a task context");
        };
        assert_eq!(ctx.task_uid, "t1");
        assert_eq!(ctx.task_status.as_deref(), Some("completed"));
    }

    #[test]
    fn dataset_event_builds_event_context() {
        let ctx = Context::from_event(
            event(
                "dataset.created",
                json!({"dataset_uid": "d1", "project_uid": "p1"}),
            ),
            RecordingSink::new(),
        );
        let Context::Event(ctx) = ctx else {
            panic!("expected an event context");
        };
        assert_eq!(ctx.resource_uid.as_deref(), Some("d1"));
        assert_eq!(ctx.resource_type.as_deref(), Some("dataset"));
        assert_eq!(ctx.project_uid.as_deref(), Some("p1"));
        assert_eq!(ctx.payload["dataset_uid"], "d1");
    }

    #[test]
    fn export_event_builds_event_context() {
        let ctx = Context::from_event(
            event("export.completed", json!({"export_uid": "x1"})),
            RecordingSink::new(),
        );
        let Context::Event(ctx) = ctx else {
            panic!("expected an event context");
        };
        assert_eq!(ctx.resource_uid.as_deref(), Some("x1"));
        assert_eq!(ctx.resource_type.as_deref(), Some("export"));
    }

    #[test]
    fn unknown_event_uses_generic_fallback() {
        let ctx = Context::from_event(
            event("future.event", json!({"some_key": "value"})),
            RecordingSink::new(),
        );
        let Context::Event(ctx) = ctx else {
            panic!("expected an event context");
        };
        assert_eq!(ctx.resource_uid, None);
        assert_eq!(ctx.resource_type, None);
        assert_eq!(ctx.payload["some_key"], "value");
    }

    #[test]
    fn empty_event_type_uses_generic_fallback() {
        let ctx = Context::from_event(event("", json!({})), RecordingSink::new());
        assert!(matches!(ctx, Context::Event(_)));
        assert_eq!(ctx.event_type(), "");
    }

    #[tokio::test]
    async fn approve_submits_through_sink() {
        let sink = RecordingSink::new();
        let ctx = Context::from_event(event("result.submitted", json!({})), sink.clone());
        ctx.approve("Looks good").await.unwrap();

        let submissions = sink.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            submissions[0],
            ("exec-1".to_string(), Action::Approve, "Looks good".to_string())
        );
    }

    #[tokio::test]
    async fn skip_never_carries_a_reason() {
        let sink = RecordingSink::new();
        let ctx = Context::from_event(event("task.completed", json!({})), sink.clone());
        ctx.skip().await.unwrap();

        let submissions = sink.submissions();
        assert_eq!(submissions[0].1, Action::Skip);
        assert_eq!(submissions[0].2, "");
    }

    #[tokio::test]
    async fn variant_action_methods_submit_for_the_right_execution() {
        let sink = RecordingSink::new();
        let ctx = Context::from_event(event("dataset.deleted", json!({})), sink.clone());
        let Context::Event(ctx) = ctx else {
            panic!("expected an event context");
        };
        ctx.reject("stale dataset").await.unwrap();
        ctx.flag("double-check").await.unwrap();

        let submissions = sink.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].0, "exec-1");
        assert_eq!(submissions[0].1, Action::Reject);
        assert_eq!(submissions[1].1, Action::Flag);
    }

    #[test]
    fn debug_output_omits_the_sink() {
        let ctx = Context::from_event(event("result.submitted", json!({})), RecordingSink::new());
        let debug = format!("{ctx:?}");
        assert!(debug.contains("exec-1"));
        assert!(!debug.contains("sink"));
    }
}
