//! Polling loop — drives the fetch → dispatch cycle.
//!
//! The runner processes executions strictly sequentially: one fetch,
//! then one dispatch at a time. Sleeping happens only between cycles
//! that found no work; a busy queue is drained back-to-back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::agent::TaskAgent;

const HANDLER_FAILURE_REASON: &str = "handler failed with an unhandled error";

/// Clonable handle that requests a graceful stop of the polling loop.
///
/// Stopping is cooperative: the in-flight cycle runs to completion and
/// the loop exits before the next fetch.
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
}

impl StopHandle {
    pub(crate) fn new(stop: Arc<AtomicBool>) -> Self {
        Self { stop }
    }

    /// Request the loop to stop after the current cycle.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Runs the agent's polling cycle until stopped.
pub struct PollingRunner<'a> {
    agent: &'a TaskAgent,
    poll_interval: Duration,
    stop: Arc<AtomicBool>,
}

impl<'a> PollingRunner<'a> {
    pub fn new(agent: &'a TaskAgent, poll_interval: Duration) -> Self {
        Self::with_stop_flag(agent, poll_interval, Arc::new(AtomicBool::new(false)))
    }

    pub(crate) fn with_stop_flag(
        agent: &'a TaskAgent,
        poll_interval: Duration,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            agent,
            poll_interval,
            stop,
        }
    }

    /// Handle that stops this runner from another task or a handler.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.stop.clone())
    }

    /// Poll until stopped by Ctrl-C or a [`StopHandle`].
    pub async fn run(&self) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Polling for pending executions"
        );
        loop {
            if self.stop.load(Ordering::SeqCst) {
                info!("Stop requested, shutting down polling loop");
                break;
            }

            let processed = self.run_once().await;
            if processed > 0 {
                // More work may already be queued; poll again right away.
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        info!("Interrupt received, shutting down polling loop");
                        break;
                    }
                }
            }
        }
    }

    /// Run one fetch → dispatch cycle; returns the number of executions
    /// processed.
    ///
    /// A handler failure never aborts the cycle: the failed item is
    /// skipped so the server does not keep it pending forever, and the
    /// cycle continues with the next item.
    pub async fn run_once(&self) -> usize {
        let batch = self.agent.fetch_pending().await;
        if batch.is_empty() {
            return 0;
        }
        debug!(count = batch.len(), "Fetched pending executions");

        let mut processed = 0;
        for execution in batch {
            let execution_uid = execution.uid.clone();
            match self.agent.dispatch(execution).await {
                Ok(()) => processed += 1,
                Err(dispatch_error) => {
                    error!(
                        execution = %execution_uid,
                        error = %dispatch_error,
                        "Handler failed, skipping execution"
                    );
                    if let Err(skip_error) = self
                        .agent
                        .submit_skip(&execution_uid, HANDLER_FAILURE_REASON)
                        .await
                    {
                        warn!(
                            execution = %execution_uid,
                            error = %skip_error,
                            "Could not skip failed execution"
                        );
                    }
                }
            }
        }
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::TaskAgent;
    use crate::test_support::{MockApi, execution};
    use avala_core::{Action, Error};
    use serde_json::json;

    #[tokio::test]
    async fn run_once_returns_zero_when_queue_is_empty() {
        let api = MockApi::new();
        let mut agent = TaskAgent::with_client(api.clone());
        agent.register().await.unwrap();

        let runner = PollingRunner::new(&agent, Duration::from_millis(1));
        assert_eq!(runner.run_once().await, 0);
        assert!(api.actions().is_empty());
    }

    #[tokio::test]
    async fn run_once_skips_failed_items_and_keeps_going() {
        let api = MockApi::with_batches(vec![Ok(vec![
            execution("e1", "result.submitted", json!({})),
            execution("e2", "result.submitted", json!({})),
        ])]);
        let mut agent = TaskAgent::with_client(api.clone());
        agent
            .on_fn("result.submitted", |ctx| async move {
                if ctx.execution_uid() == "e1" {
                    return Err(Error::Handler("bad input".into()));
                }
                ctx.approve("fine").await
            })
            .unwrap();
        agent.register().await.unwrap();

        let runner = PollingRunner::new(&agent, Duration::from_millis(1));
        assert_eq!(runner.run_once().await, 1);

        let actions = api.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].execution_uid, "e1");
        assert_eq!(actions[0].action, Action::Skip);
        assert_eq!(actions[0].reason, HANDLER_FAILURE_REASON);
        assert_eq!(actions[1].execution_uid, "e2");
        assert_eq!(actions[1].action, Action::Approve);
    }

    #[tokio::test]
    async fn skip_failures_are_swallowed() {
        let api = MockApi::with_batches(vec![Ok(vec![execution(
            "e1",
            "result.submitted",
            json!({}),
        )])]);
        api.fail_actions.store(true, Ordering::SeqCst);
        let mut agent = TaskAgent::with_client(api.clone());
        agent
            .on_fn("result.submitted", |_ctx| async {
                Err(Error::Handler("boom".into()))
            })
            .unwrap();
        agent.register().await.unwrap();

        let runner = PollingRunner::new(&agent, Duration::from_millis(1));
        // Both the handler and the compensating skip fail; the cycle
        // still completes.
        assert_eq!(runner.run_once().await, 0);
        assert_eq!(api.actions().len(), 1);
    }

    #[tokio::test]
    async fn run_once_treats_fetch_errors_as_empty() {
        let api = MockApi::with_batches(vec![Err(Error::Api {
            status_code: 503,
            message: "unavailable".into(),
        })]);
        let mut agent = TaskAgent::with_client(api.clone());
        agent.register().await.unwrap();

        let runner = PollingRunner::new(&agent, Duration::from_millis(1));
        assert_eq!(runner.run_once().await, 0);
    }

    #[tokio::test]
    async fn run_stops_when_a_handler_requests_it() {
        let api = MockApi::with_batches(vec![Ok(vec![execution(
            "e1",
            "task.completed",
            json!({}),
        )])]);
        let mut agent = TaskAgent::with_client(api.clone())
            .with_poll_interval(Duration::from_millis(1));
        let stop = agent.stop_handle();
        let stop_in_handler = stop.clone();
        agent
            .on_fn("task.completed", move |ctx| {
                let stop = stop_in_handler.clone();
                async move {
                    stop.stop();
                    ctx.approve("").await
                }
            })
            .unwrap();

        agent.run().await.unwrap();

        assert!(stop.is_stopped());
        let actions = api.actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, Action::Approve);
    }
}
