//! HTTP query-engine binding.
//!
//! Implements the [`QueryEngine`] trait against a REST-shaped engine API:
//!
//! - `POST   {base}/queries`              submit, returns `{"query_id": ...}`
//! - `GET    {base}/queries/{id}`         poll, returns `{"state": ...}`
//! - `GET    {base}/queries/{id}/result`  fetch the native result
//! - `POST   {base}/queries/{id}/cancel`  request cancellation
//!
//! Submission refusals (4xx on submit) surface as `SubmissionRejected`;
//! transport failures surface as `EngineUnavailable`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{ColumnInfo, EngineStatus, JobId, NativeResult, QueryEngine, Value};
use crate::error::{GatewayError, Result};

/// Default timeout for individual engine API requests. This bounds one HTTP
/// round trip, not the job; job duration is governed by the orchestrator's
/// deadline.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP engine binding configuration.
#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    /// Base URL of the engine API (e.g. `https://engine.internal/v1`).
    pub base_url: String,
    /// Optional bearer token for authentication.
    pub api_token: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl HttpEngineConfig {
    /// Creates a new config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Sets the bearer token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}

/// HTTP client for an asynchronous query engine.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    config: HttpEngineConfig,
    base: Url,
    client: Client,
}

impl HttpEngine {
    /// Creates a new binding from the given configuration.
    pub fn new(config: HttpEngineConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::config(format!("Invalid engine endpoint: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::engine_unavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::config("Engine endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn transport_error(context: &str, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::engine_unavailable(format!("{context} timed out"))
        } else if e.is_connect() {
            GatewayError::engine_unavailable(format!("{context}: connection failed"))
        } else {
            GatewayError::engine_unavailable(format!("{context}: {e}"))
        }
    }

    /// Classifies a submit response: 4xx means the engine looked at the job
    /// and refused it, any other non-success means the engine could not be
    /// used. A success body must carry the new job's identifier.
    fn submit_outcome(status: StatusCode, body: &str) -> Result<JobId> {
        if status.is_client_error() {
            return Err(GatewayError::submission_rejected(Self::error_message(
                status, body,
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::engine_unavailable(Self::error_message(
                status, body,
            )));
        }

        let submitted: SubmitResponse = serde_json::from_str(body).map_err(|e| {
            GatewayError::engine_unavailable(format!("Malformed submit response: {e}"))
        })?;

        Ok(JobId::new(submitted.query_id))
    }

    /// Extracts a human-readable message from an error response body.
    fn error_message(status: StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            parsed.message
        } else if body.is_empty() {
            format!("engine returned {status}")
        } else {
            format!("engine returned {status}: {body}")
        }
    }
}

#[async_trait]
impl QueryEngine for HttpEngine {
    async fn submit(&self, statement: &str, database: &str, workgroup: &str) -> Result<JobId> {
        let request = SubmitRequest {
            statement,
            database,
            workgroup,
        };

        let response = self
            .authorize(self.client.post(self.endpoint(&["queries"])?))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error("submit", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_error("submit", e))?;

        Self::submit_outcome(status, &body)
    }

    async fn poll(&self, job: &JobId) -> Result<EngineStatus> {
        let response = self
            .authorize(self.client.get(self.endpoint(&["queries", job.as_str()])?))
            .send()
            .await
            .map_err(|e| Self::transport_error("poll", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_error("poll", e))?;

        if !status.is_success() {
            return Err(GatewayError::engine_unavailable(Self::error_message(
                status, &body,
            )));
        }

        let state: StateResponse = serde_json::from_str(&body).map_err(|e| {
            GatewayError::engine_unavailable(format!("Malformed poll response: {e}"))
        })?;

        match state.state.to_ascii_uppercase().as_str() {
            "QUEUED" | "SUBMITTED" | "PENDING" => Ok(EngineStatus::Queued),
            "RUNNING" => Ok(EngineStatus::Running),
            "SUCCEEDED" => Ok(EngineStatus::Succeeded),
            "FAILED" => Ok(EngineStatus::Failed {
                message: state
                    .error_message
                    .unwrap_or_else(|| "engine reported failure without a message".to_string()),
            }),
            "CANCELLED" => Ok(EngineStatus::Cancelled),
            other => Err(GatewayError::engine_unavailable(format!(
                "Unknown job state: {other}"
            ))),
        }
    }

    async fn fetch_result(&self, job: &JobId) -> Result<NativeResult> {
        let response = self
            .authorize(
                self.client
                    .get(self.endpoint(&["queries", job.as_str(), "result"])?),
            )
            .send()
            .await
            .map_err(|e| Self::transport_error("fetch result", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::transport_error("fetch result", e))?;

        if !status.is_success() {
            return Err(GatewayError::engine_unavailable(Self::error_message(
                status, &body,
            )));
        }

        let raw: ResultResponse = serde_json::from_str(&body).map_err(|e| {
            GatewayError::engine_unavailable(format!("Malformed result response: {e}"))
        })?;

        let rows = raw
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(json_to_value).collect())
            .collect();

        Ok(NativeResult {
            columns: raw.columns,
            rows,
            bytes_scanned: raw.bytes_scanned,
        })
    }

    async fn cancel(&self, job: &JobId) -> Result<()> {
        let response = self
            .authorize(
                self.client
                    .post(self.endpoint(&["queries", job.as_str(), "cancel"])?),
            )
            .send()
            .await
            .map_err(|e| Self::transport_error("cancel", e))?;

        if !response.status().is_success() {
            return Err(GatewayError::engine_unavailable(format!(
                "cancel returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Converts a JSON cell into an engine-native value.
fn json_to_value(cell: serde_json::Value) -> Value {
    match cell {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        // Arrays and objects are not native cell shapes; keep their JSON text
        other => Value::String(other.to_string()),
    }
}

// Engine API wire types

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    statement: &'a str,
    database: &'a str,
    workgroup: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    query_id: String,
}

#[derive(Debug, Deserialize)]
struct StateResponse {
    state: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    #[serde(default)]
    columns: Vec<ColumnInfo>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    bytes_scanned: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HttpEngineConfig::new("https://engine.internal/v1");
        assert_eq!(config.base_url, "https://engine.internal/v1");
        assert!(config.api_token.is_none());
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_builders() {
        let config = HttpEngineConfig::new("https://engine.internal/v1")
            .with_api_token("secret")
            .with_request_timeout(30);
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let err = HttpEngine::new(HttpEngineConfig::new("not a url")).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn test_endpoint_paths() {
        let engine = HttpEngine::new(HttpEngineConfig::new("https://engine.internal/v1")).unwrap();
        let url = engine.endpoint(&["queries", "q-1", "result"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://engine.internal/v1/queries/q-1/result"
        );
    }

    #[test]
    fn test_submit_refusal_maps_to_submission_rejected() {
        let err = HttpEngine::submit_outcome(
            StatusCode::FORBIDDEN,
            r#"{"message":"workgroup disabled"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "SubmissionRejected");
        assert!(err.to_string().contains("workgroup disabled"));
    }

    #[test]
    fn test_submit_server_error_maps_to_engine_unavailable() {
        let err = HttpEngine::submit_outcome(StatusCode::BAD_GATEWAY, "").unwrap_err();
        assert_eq!(err.kind(), "EngineUnavailable");
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_submit_success_carries_job_id() {
        let job = HttpEngine::submit_outcome(StatusCode::OK, r#"{"query_id":"q-42"}"#).unwrap();
        assert_eq!(job.as_str(), "q-42");
    }

    #[test]
    fn test_submit_malformed_success_body_is_unavailable() {
        let err = HttpEngine::submit_outcome(StatusCode::OK, "not json").unwrap_err();
        assert_eq!(err.kind(), "EngineUnavailable");
        assert!(err.to_string().contains("Malformed submit response"));
    }

    #[test]
    fn test_transport_error_maps_to_engine_unavailable() {
        // A request that cannot even be built exercises the generic branch
        let e = Client::new().get("not a url").build().unwrap_err();
        let err = HttpEngine::transport_error("submit", e);
        assert_eq!(err.kind(), "EngineUnavailable");
        assert!(err.to_string().contains("submit"));
    }

    #[test]
    fn test_error_message_parsing() {
        let msg = HttpEngine::error_message(
            StatusCode::FORBIDDEN,
            r#"{"message":"workgroup not allowed"}"#,
        );
        assert_eq!(msg, "workgroup not allowed");

        let msg = HttpEngine::error_message(StatusCode::BAD_GATEWAY, "");
        assert!(msg.contains("502"));
    }

    #[test]
    fn test_json_to_value() {
        assert_eq!(json_to_value(serde_json::Value::Null), Value::Null);
        assert_eq!(json_to_value(serde_json::json!(true)), Value::Bool(true));
        assert_eq!(json_to_value(serde_json::json!(7)), Value::Int(7));
        assert_eq!(json_to_value(serde_json::json!(2.5)), Value::Float(2.5));
        assert_eq!(
            json_to_value(serde_json::json!("x")),
            Value::String("x".to_string())
        );
        assert_eq!(
            json_to_value(serde_json::json!([1, 2])),
            Value::String("[1,2]".to_string())
        );
    }

    #[test]
    fn test_state_response_parsing() {
        let state: StateResponse =
            serde_json::from_str(r#"{"state":"FAILED","error_message":"type mismatch"}"#).unwrap();
        assert_eq!(state.state, "FAILED");
        assert_eq!(state.error_message.as_deref(), Some("type mismatch"));
    }

    #[test]
    fn test_result_response_parsing() {
        let raw: ResultResponse = serde_json::from_str(
            r#"{"columns":[{"name":"n","type":"bigint"}],"rows":[[1],[null]],"bytes_scanned":42}"#,
        )
        .unwrap();
        assert_eq!(raw.columns.len(), 1);
        assert_eq!(raw.columns[0].name, "n");
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.bytes_scanned, 42);
    }
}
