//! Handler registry — maps event identifiers to user callbacks.
//!
//! Populated during configuration, before polling starts, and read-only
//! afterwards. Registering the same identifier twice silently replaces
//! the earlier handler (last registration wins).

use std::collections::HashMap;
use std::sync::Arc;

use avala_core::handler::EventHandler;

/// Process-local mapping from event identifier to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an event identifier. Replaces any
    /// existing handler for the same identifier.
    pub fn register(&mut self, event: &str, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(event.to_string(), handler);
    }

    /// Look up the handler for an event identifier.
    pub fn get(&self, event: &str) -> Option<Arc<dyn EventHandler>> {
        self.handlers.get(event).cloned()
    }

    /// The identifiers with a registered handler, sorted for a stable
    /// registration payload.
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.handlers.keys().cloned().collect();
        events.sort();
        events
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
