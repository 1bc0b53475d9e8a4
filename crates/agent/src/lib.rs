//! The Avala task agent — register handlers, poll, decide.
//!
//! The agent follows a **fetch → dispatch → decide** cycle:
//!
//! 1. **Register** itself with the platform (once per process lifetime)
//! 2. **Fetch** the pending executions assigned to it
//! 3. **Dispatch** each execution to the handler registered for its
//!    event type, handing the handler a typed context
//! 4. The handler **decides** (approve / reject / flag / skip) through
//!    the context; unhandled event types are skipped automatically
//! 5. Sleep only when a cycle found no work, then poll again
//!
//! A misbehaving handler (error return or panic) never stops the loop:
//! the failed item is skipped so it does not stay stuck server-side,
//! and the cycle moves on to the next item.
//!
//! ```no_run
//! use avala_agent::{Context, TaskAgent};
//!
//! #[tokio::main]
//! async fn main() -> avala_agent::Result<()> {
//!     let mut agent = TaskAgent::new("avk_...")?.with_name("quality-checker");
//!
//!     agent.on_fn("result.submitted", |ctx| async move {
//!         match &ctx {
//!             Context::Result(result) if result.result_data.is_empty() => {
//!                 ctx.reject("No annotations found").await
//!             }
//!             _ => ctx.approve("").await,
//!         }
//!     })?;
//!
//!     agent.run().await
//! }
//! ```

pub mod agent;
pub mod registry;
pub mod runner;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::TaskAgent;
pub use registry::HandlerRegistry;
pub use runner::{PollingRunner, StopHandle};

// Re-export the core vocabulary so handler code only needs this crate.
pub use avala_core::{
    Action, AgentEvent, Context, Error, EventCategory, EventContext, EventHandler, FnHandler,
    Result, ResultContext, TaskContext,
};
