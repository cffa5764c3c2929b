//! Error types for the engine module.

use thiserror::Error;

/// Errors raised while creating, driving, or disposing an engine instance.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host has not exposed an engine entry point.
    #[error("Engine bootstrap unavailable: {reason}")]
    BootstrapUnavailable { reason: String },

    /// The entry point exists but failed while loading the engine.
    #[error("Engine initialization failed: {reason}")]
    InitFailed { reason: String },

    /// No engine instance is currently loaded.
    #[error("Engine not initialized")]
    NotInitialized,

    /// The engine entry point threw while starting a command.
    #[error("Engine call failed: {reason}")]
    CallFailed { reason: String },

    /// Shutting the engine down failed.
    #[error("Engine exit failed: {reason}")]
    ExitFailed { reason: String },
}

impl EngineError {
    /// Creates a new bootstrap unavailable error.
    pub fn bootstrap_unavailable(reason: impl Into<String>) -> Self {
        Self::BootstrapUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new init failed error.
    pub fn init_failed(reason: impl Into<String>) -> Self {
        Self::InitFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new call failed error.
    pub fn call_failed(reason: impl Into<String>) -> Self {
        Self::CallFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new exit failed error.
    pub fn exit_failed(reason: impl Into<String>) -> Self {
        Self::ExitFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::bootstrap_unavailable("ffmpeg not on PATH");
        assert_eq!(
            err.to_string(),
            "Engine bootstrap unavailable: ffmpeg not on PATH"
        );

        let err = EngineError::init_failed("exit status 1");
        assert!(matches!(err, EngineError::InitFailed { .. }));
        assert!(err.to_string().contains("exit status 1"));
    }
}
