//! Trait definitions for the engine module.
//!
//! These traits describe the host-facing surface of an embedded media engine:
//! a bootstrap hook that produces a module, the module's synchronous entry
//! point, and the virtual filesystem it reads inputs from and writes outputs to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;

use super::error::EngineError;

/// Receives one line of engine output.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Maps an auxiliary asset path requested by the engine to where it really lives.
pub type PathResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Output stream a log line was emitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStream {
    /// Standard output.
    Out,
    /// Standard error.
    Err,
}

impl LogStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Out => "out",
            Self::Err => "err",
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callbacks wired into an engine module when it is loaded.
#[derive(Clone)]
pub struct EngineHooks {
    /// Sink for standard-output lines.
    pub print: LineSink,
    /// Sink for standard-error lines.
    pub print_err: LineSink,
    /// Resolves auxiliary asset paths (worker script, binary payload).
    pub locate_file: PathResolver,
}

impl EngineHooks {
    /// Hooks that discard all output and resolve every path to itself.
    pub fn noop() -> Self {
        Self {
            print: Arc::new(|_| {}),
            print_err: Arc::new(|_| {}),
            locate_file: Arc::new(|path| path.to_string()),
        }
    }

    /// Forwards a line to the sink for `stream`.
    pub fn emit(&self, stream: LogStream, line: &str) {
        match stream {
            LogStream::Out => (self.print)(line),
            LogStream::Err => (self.print_err)(line),
        }
    }
}

impl fmt::Debug for EngineHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHooks").finish_non_exhaustive()
    }
}

/// The engine's private path namespace.
///
/// Semantics follow a minimal POSIX-like filesystem: `mkdir` fails with
/// `AlreadyExists` on an existing path and `NotFound` on a missing parent,
/// and `write_file` does not create parent directories.
#[async_trait]
pub trait EngineFs: Send + Sync {
    /// Creates a single directory.
    async fn mkdir(&self, path: &str) -> io::Result<()>;

    /// Creates or truncates a file with the given contents.
    async fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()>;

    /// Reads a whole file.
    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Removes a file.
    async fn unlink(&self, path: &str) -> io::Result<()>;
}

/// One loaded engine instance.
///
/// An instance executes at most one command; callers are expected to
/// [`exit`](EngineModule::exit) it afterwards and load a fresh one.
pub trait EngineModule: Send {
    /// Handle to the instance's virtual filesystem.
    fn fs(&self) -> Arc<dyn EngineFs>;

    /// Starts a command. Returns as soon as the command is launched; progress
    /// and completion are only observable through the log sinks.
    fn call_main(&mut self, args: &[String]) -> Result<(), EngineError>;

    /// Shuts the instance down and discards its namespace.
    fn exit(&mut self) -> Result<(), EngineError>;
}

/// Host-provided factory for engine modules.
#[async_trait]
pub trait EngineBootstrap: Send + Sync {
    /// Returns the name of this bootstrap implementation.
    fn name(&self) -> &str;

    /// Loads a fresh engine module wired to `hooks`.
    async fn load(&self, hooks: EngineHooks) -> Result<Box<dyn EngineModule>, EngineError>;
}
