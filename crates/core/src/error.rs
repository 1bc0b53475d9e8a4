//! Error types for the Avala agents SDK.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Registration and action submission each have their own sub-enum so
//! callers can match on the failure class; timeouts are kept distinct
//! from other transport failures at the top level.

use thiserror::Error;

/// The top-level error type for all SDK operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Registration errors ---
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    // --- Action submission errors ---
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    // --- Timeouts, distinct from other transport failures ---
    #[error("Request timed out: {0}")]
    Timeout(String),

    // --- Transport failure outside registration/action paths ---
    #[error("Network error: {0}")]
    Network(String),

    // --- Non-success response outside registration/action paths ---
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    // --- A user handler returned an error or panicked ---
    #[error("Handler failed: {0}")]
    Handler(String),

    // --- Registration-time rejection of an unrecognised identifier ---
    #[error("Unknown event '{event}'. Supported events: {supported}")]
    UnknownEvent { event: String, supported: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to register (or update) the agent on the server.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    #[error("Registration rejected: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Network error during registration: {0}")]
    Network(String),

    #[error("Malformed registration response: {0}")]
    MalformedResponse(String),
}

/// Failure to submit an agent action for an execution.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("Action rejected: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Network error while submitting action: {0}")]
    Network(String),
}
