//! Recognition of duration, progress, and completion lines.

use regex_lite::{Captures, Regex};

use super::types::{
    CompletionMarker, CompletionOutcome, DurationEvent, LogEvent, ProgressEvent,
};

/// Substrings that mark a successfully finished command.
pub const SUCCESS_MARKERS: &[&str] = &["kB muxing overhead", "KiB muxing overhead"];

/// Substrings that mark a command the engine gave up on.
pub const FAILURE_MARKERS: &[&str] = &[
    "Invalid argument",
    "Invalid data found",
    "At least one output file",
    "Conversion failed!",
    "No such file or directory",
    "Error opening input",
];

const DURATION_PATTERN: &str = r"Duration..(\d\d).(\d\d).(\d\d).(\d+)";
const PROGRESS_PATTERN: &str = r"time.(\d\d).(\d\d).(\d\d).(\d+)";

/// Classifies engine log lines for one job at a time.
///
/// The only state is the active duration: the first positive duration seen
/// since the last [`reset`](Self::reset). It is the denominator for every
/// later progress ratio.
#[derive(Debug)]
pub struct LogExtractor {
    duration_regex: Option<Regex>,
    progress_regex: Option<Regex>,
    active_duration: Option<f64>,
}

impl Default for LogExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LogExtractor {
    pub fn new() -> Self {
        Self {
            duration_regex: Regex::new(DURATION_PATTERN).ok(),
            progress_regex: Regex::new(PROGRESS_PATTERN).ok(),
            active_duration: None,
        }
    }

    /// The duration adopted for the current job, if one has been seen.
    pub fn active_duration(&self) -> Option<f64> {
        self.active_duration
    }

    /// Forgets the active duration before a new job.
    pub fn reset(&mut self) {
        self.active_duration = None;
    }

    /// Classifies a line and adopts its duration if none is active yet.
    pub fn ingest(&mut self, line: &str) -> LogEvent {
        let event = self.classify(line);
        if let LogEvent::Duration(duration) = event {
            if self.active_duration.is_none() && duration.total_secs > 0.0 {
                self.active_duration = Some(duration.total_secs);
            }
        }
        event
    }

    /// Classifies a line without changing any state.
    ///
    /// Completion markers take precedence over durations, which take
    /// precedence over progress ticks.
    pub fn classify(&self, line: &str) -> LogEvent {
        if let Some(marker) = detect_completion(line) {
            return LogEvent::Completion(marker);
        }

        if let Some(total_secs) = self
            .duration_regex
            .as_ref()
            .and_then(|re| re.captures(line))
            .and_then(|caps| timestamp_secs(&caps))
        {
            return LogEvent::Duration(DurationEvent { total_secs });
        }

        if let Some(elapsed_secs) = self
            .progress_regex
            .as_ref()
            .and_then(|re| re.captures(line))
            .and_then(|caps| timestamp_secs(&caps))
        {
            let ratio_percent = self
                .active_duration
                .filter(|d| *d > 0.0)
                .map(|d| (elapsed_secs / d * 100.0).floor().max(0.0) as u32);
            return LogEvent::Progress(ProgressEvent {
                elapsed_secs,
                ratio_percent,
            });
        }

        LogEvent::Unrecognized
    }
}

/// Looks for a success or failure marker in a line.
pub fn detect_completion(line: &str) -> Option<CompletionMarker> {
    let outcome = if SUCCESS_MARKERS.iter().any(|m| line.contains(m)) {
        CompletionOutcome::Success
    } else if FAILURE_MARKERS.iter().any(|m| line.contains(m)) {
        CompletionOutcome::Failure
    } else {
        return None;
    };
    Some(CompletionMarker {
        outcome,
        line: line.to_string(),
    })
}

/// Converts `HH`, `MM`, `SS` and fraction captures to seconds.
///
/// The fraction digits are read as a decimal fraction, so `50` is half a
/// second regardless of how many digits the engine prints.
fn timestamp_secs(caps: &Captures<'_>) -> Option<f64> {
    if caps.len() < 5 {
        return None;
    }
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    let fraction: f64 = format!("0.{}", caps.get(4)?.as_str()).parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds + fraction)
}
