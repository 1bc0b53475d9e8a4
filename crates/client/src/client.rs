//! The reqwest-backed Avala API client.
//!
//! Endpoints consumed:
//! - `POST /agents/` — register the agent, returns the assigned uid
//! - `GET /agents/{uid}/executions/` — fetch pending executions
//! - `POST /agent-actions/` — submit a terminal decision
//!
//! Authentication is an `X-Avala-Api-Key` header on every request.
//! No automatic retry anywhere — callers decide.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use avala_core::action::Action;
use avala_core::api::{ActionSink, AgentRegistration, ExecutionFilters, PlatformApi};
use avala_core::error::{ActionError, Error, RegistrationError, Result};
use avala_core::execution::{Execution, parse_execution_batch};

/// Production API base URL, used when `AVALA_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.avala.ai/api/v1";

const API_KEY_ENV: &str = "AVALA_API_KEY";
const BASE_URL_ENV: &str = "AVALA_BASE_URL";
const API_KEY_HEADER: &str = "X-Avala-Api-Key";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Avala platform API.
pub struct AvalaClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for AvalaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvalaClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl AvalaClient {
    /// Create a client with an explicit API key (`avk_...`).
    ///
    /// The base URL falls back to the `AVALA_BASE_URL` environment
    /// variable, then the production default.
    pub fn new(api_key: impl Into<String>) -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: build_http(DEFAULT_TIMEOUT),
        }
    }

    /// Create a client from the `AVALA_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config {
                message: format!(
                    "No API key provided. Pass an api_key or set the {API_KEY_ENV} \
                     environment variable."
                ),
            })?;
        Ok(Self::new(api_key))
    }

    /// Override the API base URL (e.g. for a staging environment).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the per-request timeout (default 30s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn build_http(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

#[async_trait]
impl ActionSink for AvalaClient {
    async fn submit_action(
        &self,
        execution_uid: &str,
        action: Action,
        reason: &str,
    ) -> Result<()> {
        let url = format!("{}/agent-actions/", self.base_url);
        let request = ActionRequest {
            execution: execution_uid,
            action,
            reason,
        };

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!(
                        "Timed out while submitting action '{action}' \
                         for execution '{execution_uid}': {e}"
                    ))
                } else {
                    ActionError::Network(format!(
                        "submitting action '{action}' for execution '{execution_uid}': {e}"
                    ))
                    .into()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::Rejected {
                status_code: status.as_u16(),
                message: format!(
                    "Failed to submit action '{action}' for execution '{execution_uid}'"
                ),
            }
            .into());
        }

        debug!(action = %action, execution = %execution_uid, "Action submitted");
        Ok(())
    }
}

#[async_trait]
impl PlatformApi for AvalaClient {
    async fn register_agent(&self, registration: &AgentRegistration) -> Result<String> {
        let url = format!("{}/agents/", self.base_url);
        debug!(agent = %registration.name, "Registering agent");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(registration)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Timed out during registration: {e}"))
                } else {
                    RegistrationError::Network(e.to_string()).into()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), agent = %registration.name, "Registration rejected");
            return Err(RegistrationError::Rejected {
                status_code: status.as_u16(),
                message: format!("Failed to register agent '{}'", registration.name),
            }
            .into());
        }

        let body: RegisterAgentResponse = response
            .json()
            .await
            .map_err(|e| RegistrationError::MalformedResponse(e.to_string()))?;

        match body.uid {
            Some(uid) if !uid.is_empty() => Ok(uid),
            _ => Err(RegistrationError::MalformedResponse(format!(
                "server returned success but no agent uid for '{}'",
                registration.name
            ))
            .into()),
        }
    }

    async fn fetch_pending_executions(
        &self,
        agent_uid: &str,
        filters: &ExecutionFilters,
    ) -> Result<Vec<Execution>> {
        let url = format!("{}/agents/{}/executions/", self.base_url, agent_uid);
        let mut query: Vec<(&str, String)> = vec![("status", "pending".to_string())];
        if let Some(project) = &filters.project {
            query.push(("project", project.clone()));
        }
        if !filters.task_types.is_empty() {
            query.push(("task_types", filters.task_types.join(",")));
        }

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Timed out while fetching executions: {e}"))
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status_code: status.as_u16(),
                message: "Failed to fetch executions".into(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(parse_execution_batch(&body))
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ActionRequest<'a> {
    execution: &'a str,
    action: Action,
    /// Omitted from the body entirely when empty — the server treats
    /// an empty reason and an absent reason differently.
    #[serde(skip_serializing_if = "str::is_empty")]
    reason: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterAgentResponse {
    #[serde(default)]
    uid: Option<String>,
}
