//! Query-engine capability layer.
//!
//! The gateway never depends on a concrete engine client. It depends on the
//! narrow [`QueryEngine`] trait (submit / poll / fetch-result / cancel over
//! a named database and workgroup); any concrete binding implements it, and
//! tests substitute in-memory doubles.

mod http;
mod mock;
mod types;

pub use http::{HttpEngine, HttpEngineConfig};
pub use mock::{FailingEngine, MockEngine, UnreachableEngine};
pub use types::{ColumnInfo, NativeResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Opaque handle for one submitted job, unique per submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Wraps an engine-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engine-reported status of a job, as seen by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Admitted but not yet running.
    Queued,
    /// Currently executing.
    Running,
    /// Finished successfully; a result can be fetched.
    Succeeded,
    /// Finished with an engine-reported error.
    Failed { message: String },
    /// Cancelled on the engine side.
    Cancelled,
}

impl EngineStatus {
    /// Returns true if no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. } | Self::Cancelled)
    }
}

/// Trait defining the interface to an asynchronous query engine.
///
/// All operations are async and return Results with GatewayError. The engine
/// and its storage are shared across requests and never mutated through this
/// interface; the only external artifacts created are the engine's own
/// ephemeral job and result objects.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submits a statement for execution, returning the new job's handle.
    async fn submit(&self, statement: &str, database: &str, workgroup: &str) -> Result<JobId>;

    /// Polls the current status of a job.
    async fn poll(&self, job: &JobId) -> Result<EngineStatus>;

    /// Fetches the native result of a terminally succeeded job.
    async fn fetch_result(&self, job: &JobId) -> Result<NativeResult>;

    /// Requests cancellation of a job. Best-effort; callers do not depend on
    /// the outcome.
    async fn cancel(&self, job: &JobId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_display() {
        let id = JobId::new("q-1234");
        assert_eq!(id.to_string(), "q-1234");
        assert_eq!(id.as_str(), "q-1234");
    }

    #[test]
    fn test_engine_status_terminal() {
        assert!(!EngineStatus::Queued.is_terminal());
        assert!(!EngineStatus::Running.is_terminal());
        assert!(EngineStatus::Succeeded.is_terminal());
        assert!(EngineStatus::Failed {
            message: "boom".to_string()
        }
        .is_terminal());
        assert!(EngineStatus::Cancelled.is_terminal());
    }
}
