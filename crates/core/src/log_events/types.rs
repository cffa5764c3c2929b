//! Typed events recognized in engine log output.

use serde::{Deserialize, Serialize};

/// Total media duration announced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationEvent {
    pub total_secs: f64,
}

/// Periodic progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Media time processed so far, in seconds.
    pub elapsed_secs: f64,
    /// `floor(elapsed / duration * 100)` when the duration is known.
    pub ratio_percent: Option<u32>,
}

impl ProgressEvent {
    /// Value reported to progress observers.
    ///
    /// This is the ratio when the duration is known, and the raw elapsed
    /// seconds otherwise. Observers share one channel for both units.
    pub fn observed_value(&self) -> f64 {
        match self.ratio_percent {
            Some(ratio) => f64::from(ratio),
            None => self.elapsed_secs,
        }
    }
}

/// Whether a completion marker signals success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Success,
    Failure,
}

/// A log line that ends the current command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub outcome: CompletionOutcome,
    /// The full line the marker was found in.
    pub line: String,
}

impl CompletionMarker {
    pub fn is_success(&self) -> bool {
        self.outcome == CompletionOutcome::Success
    }
}

/// Classification of one log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    Duration(DurationEvent),
    Progress(ProgressEvent),
    Completion(CompletionMarker),
    Unrecognized,
}
