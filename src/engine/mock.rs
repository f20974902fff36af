//! Mock query engines for testing.
//!
//! In-memory implementations of [`QueryEngine`] that replay a scripted
//! status sequence and count submissions, polls, and cancellations so tests
//! can assert on side effects (in particular: rejected statements creating
//! zero jobs).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{EngineStatus, JobId, NativeResult, QueryEngine};
use crate::error::{GatewayError, Result};

/// A mock engine that walks through a scripted status sequence.
///
/// Each poll pops the next status; once the script is exhausted the last
/// status repeats. An empty script means the job succeeds immediately.
pub struct MockEngine {
    statuses: Mutex<VecDeque<EngineStatus>>,
    result: NativeResult,
    submissions: AtomicUsize,
    polls: AtomicUsize,
    cancels: AtomicUsize,
    next_job: AtomicUsize,
}

impl MockEngine {
    /// Creates an engine whose jobs succeed on the first poll, returning
    /// `result`.
    pub fn succeeding(result: NativeResult) -> Self {
        Self::with_statuses(vec![], result)
    }

    /// Creates an engine that replays `statuses` poll by poll before
    /// settling on the last entry (or Succeeded if empty).
    pub fn with_statuses(statuses: Vec<EngineStatus>, result: NativeResult) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            result,
            submissions: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            next_job: AtomicUsize::new(1),
        }
    }

    /// Creates an engine whose jobs never reach a terminal state.
    pub fn never_finishing() -> Self {
        // Single Running entry repeats forever once the script is exhausted.
        Self::with_statuses(vec![EngineStatus::Running], NativeResult::default())
    }

    /// Number of jobs submitted so far.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Number of polls issued so far.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Number of cancellation requests received so far.
    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryEngine for MockEngine {
    async fn submit(&self, _statement: &str, _database: &str, _workgroup: &str) -> Result<JobId> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let n = self.next_job.fetch_add(1, Ordering::SeqCst);
        Ok(JobId::new(format!("mock-{n}")))
    }

    async fn poll(&self, _job: &JobId) -> Result<EngineStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self
            .statuses
            .lock()
            .map_err(|_| GatewayError::engine_unavailable("mock engine lock poisoned"))?;
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap_or(EngineStatus::Succeeded))
        } else {
            Ok(statuses
                .front()
                .cloned()
                .unwrap_or(EngineStatus::Succeeded))
        }
    }

    async fn fetch_result(&self, _job: &JobId) -> Result<NativeResult> {
        Ok(self.result.clone())
    }

    async fn cancel(&self, _job: &JobId) -> Result<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A mock engine whose admission control refuses every submission.
pub struct FailingEngine {
    message: String,
}

impl FailingEngine {
    /// Creates an engine that rejects submissions with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl QueryEngine for FailingEngine {
    async fn submit(&self, _statement: &str, _database: &str, _workgroup: &str) -> Result<JobId> {
        Err(GatewayError::submission_rejected(self.message.clone()))
    }

    async fn poll(&self, job: &JobId) -> Result<EngineStatus> {
        Err(GatewayError::engine_unavailable(format!(
            "no such job: {job}"
        )))
    }

    async fn fetch_result(&self, job: &JobId) -> Result<NativeResult> {
        Err(GatewayError::engine_unavailable(format!(
            "no such job: {job}"
        )))
    }

    async fn cancel(&self, _job: &JobId) -> Result<()> {
        Ok(())
    }
}

/// A mock engine that cannot be reached at all; every operation fails with
/// a transport error.
pub struct UnreachableEngine {
    message: String,
}

impl UnreachableEngine {
    /// Creates an engine whose operations fail with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl QueryEngine for UnreachableEngine {
    async fn submit(&self, _statement: &str, _database: &str, _workgroup: &str) -> Result<JobId> {
        Err(GatewayError::engine_unavailable(self.message.clone()))
    }

    async fn poll(&self, _job: &JobId) -> Result<EngineStatus> {
        Err(GatewayError::engine_unavailable(self.message.clone()))
    }

    async fn fetch_result(&self, _job: &JobId) -> Result<NativeResult> {
        Err(GatewayError::engine_unavailable(self.message.clone()))
    }

    async fn cancel(&self, _job: &JobId) -> Result<()> {
        Err(GatewayError::engine_unavailable(self.message.clone()))
    }
}
