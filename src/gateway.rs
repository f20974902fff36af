//! Gateway entry point.
//!
//! Drives one request through Validator → Orchestrator → Formatter in strict
//! order. A rejected statement returns immediately without ever contacting
//! the engine; an accepted request creates exactly one external job. No
//! state is retained across requests.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::QueryEngine;
use crate::error::{GatewayError, Result};
use crate::execute::Orchestrator;
use crate::format::{shape, ResultSet};
use crate::validate::{StatementValidator, Validation};

/// One structured query invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Candidate statement text.
    pub sql: String,

    /// Target database; the configured default applies when absent.
    #[serde(default)]
    pub database: Option<String>,

    /// Execution pool; the configured default applies when absent.
    #[serde(default)]
    pub workgroup: Option<String>,

    /// Wall-clock wait bound in seconds; must be positive. Defaulted and
    /// capped by configuration.
    #[serde(default)]
    pub max_wait_seconds: Option<u64>,
}

impl QueryRequest {
    /// Creates a request with gateway defaults for everything but the
    /// statement.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            database: None,
            workgroup: None,
            max_wait_seconds: None,
        }
    }
}

/// Successful response: all cells textual, aligned positionally with
/// `columns`, with truncation reported as metadata.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub bytes_scanned: u64,
    pub truncated: bool,
    pub rows_omitted: usize,
}

impl From<ResultSet> for QueryResponse {
    fn from(result: ResultSet) -> Self {
        Self {
            columns: result.columns,
            rows: result.rows,
            bytes_scanned: result.bytes_scanned,
            truncated: result.truncated,
            rows_omitted: result.rows_omitted,
        }
    }
}

/// Structured error envelope returned to callers; never a bare engine
/// stack trace.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "errorKind")]
    pub error_kind: String,
    pub message: String,
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        Self {
            error_kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// The guarded query execution gateway.
pub struct Gateway {
    engine: Arc<dyn QueryEngine>,
    config: Config,
}

impl Gateway {
    /// Creates a gateway over the given engine and configuration.
    pub fn new(engine: Arc<dyn QueryEngine>, config: Config) -> Self {
        Self { engine, config }
    }

    /// Handles one request: validate, execute under the deadline, shape the
    /// result. Each invocation is independent and owns its job handle
    /// exclusively.
    pub async fn handle(&self, request: QueryRequest) -> Result<QueryResponse> {
        let validator = StatementValidator::new(self.config.limits.max_statement_bytes);
        let (statement, kind) = match validator.validate(&request.sql) {
            Validation::Accepted { statement, kind } => (statement, kind),
            Validation::Rejected { reason, message } => {
                info!(reason = %reason, "statement rejected");
                return Err(GatewayError::invalid_statement(reason, message));
            }
        };

        let database = request
            .database
            .unwrap_or_else(|| self.config.defaults.database.clone());
        let workgroup = request
            .workgroup
            .unwrap_or_else(|| self.config.defaults.workgroup.clone());
        let max_wait = self.effective_wait(request.max_wait_seconds)?;

        info!(
            kind = %kind,
            database = %database,
            workgroup = %workgroup,
            max_wait_secs = max_wait.as_secs(),
            "statement accepted"
        );

        let orchestrator = Orchestrator::new(Arc::clone(&self.engine));
        let job = orchestrator
            .execute(&statement, &database, &workgroup, max_wait)
            .await?;

        let native = self.engine.fetch_result(&job.job_id).await?;
        let result = shape(native, &self.config.limits.result);

        if result.truncated {
            warn!(
                job_id = %job.job_id,
                rows_omitted = result.rows_omitted,
                "result truncated"
            );
        }

        Ok(QueryResponse::from(result))
    }

    /// Applies the configured default and ceiling to a requested wait. A
    /// request can lower the wait but never raise it past the ceiling; zero
    /// is not a valid wait.
    fn effective_wait(&self, requested: Option<u64>) -> Result<Duration> {
        let defaults = &self.config.defaults;
        let secs = match requested {
            Some(0) => {
                return Err(GatewayError::config("max_wait_seconds must be positive"));
            }
            Some(secs) => secs.min(defaults.wait_ceiling_seconds),
            None => defaults.max_wait_seconds,
        };
        Ok(Duration::from_secs(secs))
    }
}
