//! Commands and staged files submitted to the supervisor.

use serde::{Deserialize, Serialize};

use super::error::TranscodeError;

/// Log level the completion heuristics are written against.
pub const ENGINE_LOG_LEVEL: &str = "info";

/// Flags placed before every caller command.
pub fn default_flags(stats_period_secs: f64) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-stats_period".to_string(),
        stats_period_secs.to_string(),
        "-loglevel".to_string(),
        ENGINE_LOG_LEVEL.to_string(),
        "-nostdin".to_string(),
    ]
}

/// A non-empty engine argument list, excluding the default flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCommand {
    args: Vec<String>,
}

impl EngineCommand {
    /// Creates a command, rejecting an empty argument list.
    pub fn new<I, S>(args: I) -> Result<Self, TranscodeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(TranscodeError::invalid_command("command has no arguments"));
        }
        Ok(Self { args })
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// A byte buffer bound to a path in the engine namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Everything one run needs: the command, its inputs, and where the output lands.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub command: EngineCommand,
    pub inputs: Vec<StagedFile>,
    pub output_path: String,
}

impl TranscodeJob {
    pub fn new(command: EngineCommand, output_path: impl Into<String>) -> Self {
        Self {
            command,
            inputs: Vec::new(),
            output_path: output_path.into(),
        }
    }

    /// Adds an input file.
    pub fn with_input(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.inputs.push(StagedFile::new(path, bytes));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        assert_eq!(
            default_flags(0.2),
            vec![
                "-y",
                "-hide_banner",
                "-stats_period",
                "0.2",
                "-loglevel",
                "info",
                "-nostdin"
            ]
        );
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = EngineCommand::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidCommand { .. }));
    }

    #[test]
    fn test_job_builder() {
        let command = EngineCommand::new(["-i", "input.wav", "output.mp3"]).unwrap();
        let job = TranscodeJob::new(command, "output.mp3").with_input("input.wav", vec![1, 2, 3]);

        assert_eq!(job.command.args()[1], "input.wav");
        assert_eq!(job.inputs, vec![StagedFile::new("input.wav", vec![1, 2, 3])]);
        assert_eq!(job.output_path, "output.mp3");
    }
}
