//! Execution orchestration.
//!
//! Submits an accepted statement to the query engine and drives it to a
//! terminal state: poll with capped exponential backoff, enforce the
//! wall-clock deadline, and issue a best-effort cancellation on timeout.
//! The orchestrator never resubmits a statement; a failed or timed-out job
//! is a caller decision to retry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::engine::{EngineStatus, JobId, QueryEngine};
use crate::error::{GatewayError, Result};

/// First poll delay after submission.
const POLL_INITIAL: Duration = Duration::from_millis(100);

/// Upper bound on the poll interval.
const POLL_MAX: Duration = Duration::from_secs(2);

/// Local state of one job, driven by poll results.
///
/// Every transition except TimedOut comes from an engine poll; TimedOut is
/// asserted locally once the deadline elapses, regardless of what the engine
/// last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::TimedOut => write!(f, "TIMED_OUT"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// One in-flight or completed run against the query engine.
#[derive(Debug, Clone)]
pub struct ExecutionJob {
    /// Opaque engine handle, unique per submission.
    pub job_id: JobId,
    /// Current local state.
    pub state: JobState,
    /// Submission time.
    pub started_at: Instant,
    /// Time of the most recent poll, if any.
    pub last_polled_at: Option<Instant>,
}

/// Drives one statement through the engine to a terminal state.
pub struct Orchestrator {
    engine: Arc<dyn QueryEngine>,
}

impl Orchestrator {
    /// Creates an orchestrator over the given engine.
    pub fn new(engine: Arc<dyn QueryEngine>) -> Self {
        Self { engine }
    }

    /// Submits `statement` and waits for completion, never blocking the
    /// caller past `max_wait` from submission (plus at most one in-flight
    /// poll; the deadline is cooperative, checked between polls).
    ///
    /// Returns the job only when it terminates SUCCEEDED. Engine-reported
    /// failure, submission refusal, and deadline expiry map to their
    /// respective error variants.
    pub async fn execute(
        &self,
        statement: &str,
        database: &str,
        workgroup: &str,
        max_wait: Duration,
    ) -> Result<ExecutionJob> {
        // The binding's classification passes through untouched: a refusal
        // stays SubmissionRejected, a transport failure stays
        // EngineUnavailable.
        let job_id = self.engine.submit(statement, database, workgroup).await?;

        let started_at = Instant::now();
        let deadline = started_at + max_wait;
        debug!(job_id = %job_id, database, workgroup, "job submitted");

        let mut job = ExecutionJob {
            job_id,
            state: JobState::Submitted,
            started_at,
            last_polled_at: None,
        };
        let mut interval = POLL_INITIAL;

        loop {
            let status = self.engine.poll(&job.job_id).await?;
            job.last_polled_at = Some(Instant::now());

            match status {
                EngineStatus::Succeeded => {
                    job.state = JobState::Succeeded;
                    debug!(job_id = %job.job_id, "job succeeded");
                    return Ok(job);
                }
                EngineStatus::Failed { message } => {
                    job.state = JobState::Failed;
                    return Err(GatewayError::execution_failed(message));
                }
                EngineStatus::Cancelled => {
                    job.state = JobState::Cancelled;
                    return Err(GatewayError::execution_failed(
                        "query was cancelled by the engine",
                    ));
                }
                EngineStatus::Queued => job.state = JobState::Submitted,
                EngineStatus::Running => job.state = JobState::Running,
            }

            let now = Instant::now();
            if now >= deadline {
                job.state = JobState::TimedOut;
                warn!(job_id = %job.job_id, waited_secs = max_wait.as_secs(), "deadline exceeded, requesting cancellation");
                self.cancel_fire_and_forget(job.job_id.clone());
                return Err(GatewayError::DeadlineExceeded {
                    waited_secs: max_wait.as_secs(),
                });
            }

            // Never sleep past the deadline: cap the interval at what's left
            tokio::time::sleep(interval.min(deadline - now)).await;
            interval = (interval * 2).min(POLL_MAX);
        }
    }

    /// Issues a cancellation without awaiting its outcome. Its success or
    /// failure never changes the caller-visible result.
    fn cancel_fire_and_forget(&self, job_id: JobId) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if let Err(e) = engine.cancel(&job_id).await {
                warn!(job_id = %job_id, "cancellation request failed: {e}");
            }
        });
    }
}
