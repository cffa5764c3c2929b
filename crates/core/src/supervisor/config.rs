//! Configuration for the session supervisor.

use serde::{Deserialize, Serialize};

/// Configuration for the session supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Interval between engine stats lines, in seconds.
    #[serde(default = "default_stats_period")]
    pub stats_period_secs: f64,

    /// Additional arguments placed after the default flags.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Caller-level timeout for one run. `run` itself never times out.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_stats_period() -> f64 {
    0.2
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            stats_period_secs: default_stats_period(),
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl SupervisorConfig {
    /// Sets the stats period.
    pub fn with_stats_period(mut self, secs: f64) -> Self {
        self.stats_period_secs = secs;
        self
    }

    /// Sets the caller-level timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Appends extra engine arguments.
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}
