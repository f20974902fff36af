//! Error types for querygate.
//!
//! Defines the gateway error taxonomy. Every failure path surfaces one of
//! these variants to the caller; nothing is logged-and-swallowed and nothing
//! is retried automatically.

use thiserror::Error;

use crate::validate::RejectReason;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The statement was rejected by the validator and never reached the
    /// engine.
    #[error("Invalid statement [{}]: {message}", reason.code())]
    InvalidStatement {
        reason: RejectReason,
        message: String,
    },

    /// The engine refused to admit the job (quota, malformed request,
    /// permission).
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// The engine ran the job and reported failure.
    #[error("Engine execution failed: {0}")]
    EngineExecutionFailed(String),

    /// The orchestrator's deadline elapsed before the job reached a terminal
    /// state.
    #[error("Deadline exceeded after {waited_secs}s")]
    DeadlineExceeded { waited_secs: u64 },

    /// Transport or protocol failure talking to the engine binding,
    /// distinct from an engine-reported execution failure.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Configuration errors (invalid config file, bad endpoint, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Creates an invalid-statement error from a validator rejection.
    pub fn invalid_statement(reason: RejectReason, message: impl Into<String>) -> Self {
        Self::InvalidStatement {
            reason,
            message: message.into(),
        }
    }

    /// Creates a submission-rejected error with the given reason.
    pub fn submission_rejected(msg: impl Into<String>) -> Self {
        Self::SubmissionRejected(msg.into())
    }

    /// Creates an engine-execution-failed error with the engine's message.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::EngineExecutionFailed(msg.into())
    }

    /// Creates an engine-unavailable error with the given message.
    pub fn engine_unavailable(msg: impl Into<String>) -> Self {
        Self::EngineUnavailable(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the stable error kind used as the wire `errorKind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidStatement { .. } => "InvalidStatement",
            Self::SubmissionRejected(_) => "SubmissionRejected",
            Self::EngineExecutionFailed(_) => "EngineExecutionFailed",
            Self::DeadlineExceeded { .. } => "DeadlineExceeded",
            Self::EngineUnavailable(_) => "EngineUnavailable",
            Self::Config(_) => "ConfigurationError",
        }
    }
}

/// Result type alias using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;
