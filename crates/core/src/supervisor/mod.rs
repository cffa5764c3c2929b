//! Session supervisor: the single public entry point for transcoding.
//!
//! The supervisor composes the engine lifecycle manager, the virtual
//! filesystem bridge, and the log event extractor into an awaitable,
//! single-flight `run` operation.
//!
//! # Example
//!
//! ```ignore
//! use transcoder_core::supervisor::{EngineCommand, Observers, Supervisor, TranscodeJob};
//!
//! let supervisor = Supervisor::from_config(&config).with_observers(
//!     Observers::new().on_progress(|p| println!("progress: {p}")),
//! );
//!
//! let command = EngineCommand::new(["-i", "input.wav", "-codec:a", "libmp3lame", "-qscale:a", "2", "output.mp3"])?;
//! let job = TranscodeJob::new(command, "output.mp3").with_input("input.wav", wav_bytes);
//! let mp3_bytes = supervisor.run(job).await?;
//! ```

mod config;
mod error;
mod job;
mod observers;
mod session;
mod state;

pub use config::SupervisorConfig;
pub use error::TranscodeError;
pub use job::{default_flags, EngineCommand, StagedFile, TranscodeJob, ENGINE_LOG_LEVEL};
pub use observers::{DurationObserver, LogObserver, Observers, ProgressObserver};
pub use session::Supervisor;
pub use state::RunState;
