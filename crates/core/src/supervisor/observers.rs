//! Optional callbacks for job telemetry.

use std::fmt;
use std::sync::Arc;

use crate::engine::LogStream;

/// Receives the media duration in seconds.
pub type DurationObserver = Arc<dyn Fn(f64) + Send + Sync>;

/// Receives a 0-100 ratio, or elapsed seconds while the duration is unknown.
pub type ProgressObserver = Arc<dyn Fn(f64) + Send + Sync>;

/// Receives every raw engine log line.
pub type LogObserver = Arc<dyn Fn(LogStream, &str) + Send + Sync>;

/// Observers attached to a supervisor for its whole lifetime.
#[derive(Clone, Default)]
pub struct Observers {
    duration: Option<DurationObserver>,
    progress: Option<ProgressObserver>,
    log: Option<LogObserver>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the duration observer.
    pub fn on_duration(mut self, observer: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.duration = Some(Arc::new(observer));
        self
    }

    /// Sets the progress observer.
    pub fn on_progress(mut self, observer: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(observer));
        self
    }

    /// Sets the raw log observer.
    pub fn on_log(mut self, observer: impl Fn(LogStream, &str) + Send + Sync + 'static) -> Self {
        self.log = Some(Arc::new(observer));
        self
    }

    pub(crate) fn duration(&self, secs: f64) {
        if let Some(ref observer) = self.duration {
            observer(secs);
        }
    }

    pub(crate) fn progress(&self, value: f64) {
        if let Some(ref observer) = self.progress {
            observer(value);
        }
    }

    pub(crate) fn log(&self, stream: LogStream, line: &str) {
        if let Some(ref observer) = self.log {
            observer(stream, line);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("duration", &self.duration.is_some())
            .field("progress", &self.progress.is_some())
            .field("log", &self.log.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_unset_observers_are_noops() {
        let observers = Observers::new();
        observers.duration(1.0);
        observers.progress(2.0);
        observers.log(LogStream::Err, "line");
    }

    #[test]
    fn test_observers_receive_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (d, p, l) = (seen.clone(), seen.clone(), seen.clone());
        let observers = Observers::new()
            .on_duration(move |secs| d.lock().unwrap().push(format!("duration {secs}")))
            .on_progress(move |value| p.lock().unwrap().push(format!("progress {value}")))
            .on_log(move |stream, line| l.lock().unwrap().push(format!("{stream} {line}")));

        observers.duration(187.5);
        observers.progress(50.0);
        observers.log(LogStream::Err, "hello");

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["duration 187.5", "progress 50", "err hello"]
        );
    }
}
