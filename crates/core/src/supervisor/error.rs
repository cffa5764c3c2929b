//! Error types for the session supervisor.

use thiserror::Error;

use crate::engine::EngineError;
use crate::vfs::FsError;

/// Errors returned by [`Supervisor::run`](super::Supervisor::run).
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Another run is in flight. Runs are rejected, not queued.
    #[error("A transcode is already in progress")]
    AlreadyRunning,

    /// No engine instance could be created.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),

    /// The engine reported failure, or its entry point threw.
    #[error("Transcode failed: {message}")]
    RunFailed { message: String },

    /// An input buffer could not be staged; the engine was not invoked.
    #[error("Failed to stage input: {0}")]
    InputStageFailed(#[source] FsError),

    /// The engine reported success but the output could not be read.
    #[error("Failed to retrieve output: {0}")]
    OutputRetrieveFailed(#[source] FsError),

    /// The caller-level timeout elapsed and the engine was force-disposed.
    #[error("Transcode timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The command was rejected before anything ran.
    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },
}

impl TranscodeError {
    /// Creates a new run failed error.
    pub fn run_failed(message: impl Into<String>) -> Self {
        Self::RunFailed {
            message: message.into(),
        }
    }

    /// Creates a new invalid command error.
    pub fn invalid_command(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same job could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable(EngineError::InitFailed { .. })
                | Self::Timeout { .. }
                | Self::RunFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_failed_preserves_log_text() {
        let err = TranscodeError::run_failed("input.wav: Invalid data found when processing input");
        assert!(err.to_string().contains("Invalid data found"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(TranscodeError::Timeout { timeout_ms: 5000 }.is_retryable());
        assert!(TranscodeError::EngineUnavailable(EngineError::init_failed("boom")).is_retryable());
        assert!(!TranscodeError::EngineUnavailable(EngineError::bootstrap_unavailable("none"))
            .is_retryable());
        assert!(!TranscodeError::AlreadyRunning.is_retryable());
        assert!(!TranscodeError::invalid_command("empty").is_retryable());
    }

    #[test]
    fn test_timeout_message_keeps_sub_second_limits() {
        let err = TranscodeError::Timeout { timeout_ms: 250 };
        assert_eq!(err.to_string(), "Transcode timed out after 250 ms");
    }

    #[test]
    fn test_engine_error_converts() {
        let err: TranscodeError = EngineError::init_failed("boom").into();
        assert!(matches!(err, TranscodeError::EngineUnavailable(_)));
    }
}
