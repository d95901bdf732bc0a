//! Error types.
//!
//! - `PipelineError`: the failure taxonomy of the fetch → enrich → aggregate → present flow
//! - `AppError`: what the binary reports (message + process exit code)

use thiserror::Error;

/// Failures raised by the pipeline stages and their upstream collaborators.
///
/// Only `NoCoverage` and `DeadlineExceeded` are recoverable: the affected
/// observation is dropped and the run continues. Everything else aborts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Unknown or invalid taxon, or the observation service has no data for it.
    #[error("lookup failed: {0}")]
    Lookup(String),
    /// Network timeout, connection failure, rate limiting or a server-side error.
    #[error("transient failure: {0}")]
    Transient(String),
    /// No weather station could provide data for one observation.
    #[error("no weather coverage: {0}")]
    NoCoverage(String),
    /// Missing or rejected NOAA token.
    #[error("NOAA authentication failed: {0}")]
    Auth(String),
    /// The overall run timeout elapsed before this piece of work started.
    #[error("run deadline exceeded before {0}")]
    DeadlineExceeded(String),
    /// Invalid settings or a client that could not be constructed.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Writing an output artifact failed.
    #[error("failed to write output: {0}")]
    Output(String),
}

impl PipelineError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether the failure only affects a single observation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoCoverage(_) | Self::DeadlineExceeded(_))
    }

    /// Process exit code used when this error aborts the run.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Lookup(_) | Self::NoCoverage(_) | Self::DeadlineExceeded(_) => 3,
            Self::Transient(_) => 4,
            Self::Auth(_) => 5,
            Self::Output(_) => 6,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        Self::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
