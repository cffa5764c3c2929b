//! Engine instances backed by an external ffmpeg-compatible program.
//!
//! Each instance owns a private scratch directory that plays the role of the
//! engine's virtual filesystem. The program runs with that directory as its
//! working directory, so command arguments use namespace-relative paths.

use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::{EngineBootstrap, EngineFs, EngineHooks, EngineModule, LineSink};

/// Read buffer size for the log pumps.
const PUMP_CHUNK_SIZE: usize = 4096;

/// Emitted when the engine exits cleanly without printing a completion marker.
const EXITED_WITHOUT_MARKER: &str =
    "Conversion failed! engine exited without a completion marker";

/// Bootstrap that launches the configured engine program as a child process.
pub struct ProcessBootstrap {
    config: EngineConfig,
}

impl ProcessBootstrap {
    /// Creates a new process bootstrap with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates a bootstrap with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl EngineBootstrap for ProcessBootstrap {
    fn name(&self) -> &str {
        "process"
    }

    async fn load(&self, hooks: EngineHooks) -> Result<Box<dyn EngineModule>, EngineError> {
        let program = (hooks.locate_file)(&self.config.program);

        let output = Command::new(&program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    EngineError::bootstrap_unavailable(format!(
                        "engine program not found: {}",
                        program
                    ))
                } else {
                    EngineError::init_failed(format!("failed to launch {}: {}", program, e))
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::init_failed(format!(
                "`{} -version` exited with {}",
                program, output.status
            )));
        }

        tokio::fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(|e| {
                EngineError::init_failed(format!(
                    "failed to create {}: {}",
                    self.config.temp_dir.display(),
                    e
                ))
            })?;

        let namespace = tempfile::Builder::new()
            .prefix("engine-")
            .tempdir_in(&self.config.temp_dir)
            .map_err(|e| EngineError::init_failed(format!("failed to create namespace: {}", e)))?;

        debug!(program = %program, namespace = %namespace.path().display(), "Engine process ready");
        Ok(Box::new(ProcessEngine::new(program, namespace, hooks)))
    }
}

/// One engine instance backed by a child process.
pub struct ProcessEngine {
    program: String,
    namespace: Option<TempDir>,
    fs: Arc<DirFs>,
    hooks: EngineHooks,
    pumps: Vec<JoinHandle<()>>,
    started: bool,
}

impl ProcessEngine {
    fn new(program: String, namespace: TempDir, hooks: EngineHooks) -> Self {
        let fs = Arc::new(DirFs::new(namespace.path()));
        Self {
            program,
            namespace: Some(namespace),
            fs,
            hooks,
            pumps: Vec::new(),
            started: false,
        }
    }
}

impl EngineModule for ProcessEngine {
    fn fs(&self) -> Arc<dyn EngineFs> {
        self.fs.clone()
    }

    fn call_main(&mut self, args: &[String]) -> Result<(), EngineError> {
        if self.started {
            return Err(EngineError::call_failed(
                "engine instance already executed a command",
            ));
        }
        let root = self
            .namespace
            .as_ref()
            .map(|ns| ns.path().to_path_buf())
            .ok_or(EngineError::NotInitialized)?;

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(&root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::call_failed(format!("failed to spawn {}: {}", self.program, e)))?;
        self.started = true;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::call_failed("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::call_failed("stderr not captured"))?;

        let print = self.hooks.print.clone();
        self.pumps
            .push(tokio::spawn(async move { pump_lines(stdout, &print).await }));

        // The stderr pump owns the child so aborting it kills the process.
        // Once the child is reaped a terminal line is always emitted; after a
        // real completion marker it is ignored.
        let print_err = self.hooks.print_err.clone();
        self.pumps.push(tokio::spawn(async move {
            pump_lines(stderr, &print_err).await;
            let terminal = match child.wait().await {
                Ok(status) if !status.success() => {
                    format!("Conversion failed! engine exited with {}", status)
                }
                Ok(_) => EXITED_WITHOUT_MARKER.to_string(),
                Err(e) => format!("Conversion failed! could not reap engine: {}", e),
            };
            print_err(&terminal);
        }));

        Ok(())
    }

    fn exit(&mut self) -> Result<(), EngineError> {
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
        match self.namespace.take() {
            Some(namespace) => namespace
                .close()
                .map_err(|e| EngineError::exit_failed(format!("failed to remove namespace: {}", e))),
            None => Ok(()),
        }
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
    }
}

/// Forwards every line read from `reader` to `sink`.
///
/// Both `\n` and `\r` terminate a line; the engine rewrites its stats line
/// in place with carriage returns.
async fn pump_lines<R>(mut reader: R, sink: &LineSink)
where
    R: AsyncRead + Unpin,
{
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; PUMP_CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        for &byte in &chunk[..n] {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut pending, sink);
            } else {
                pending.push(byte);
            }
        }
    }
    flush_line(&mut pending, sink);
}

fn flush_line(pending: &mut Vec<u8>, sink: &LineSink) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending).to_string();
    pending.clear();
    sink(&line);
}

/// Virtual filesystem rooted at a host directory.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    /// Creates a filesystem rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a virtual path to a host path under the root.
    ///
    /// A leading `/` denotes the namespace root. Parent components are
    /// rejected so a path can never leave the namespace.
    pub fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("path escapes engine namespace: {}", path),
                    ))
                }
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl EngineFs for DirFs {
    async fn mkdir(&self, path: &str) -> io::Result<()> {
        tokio::fs::create_dir(self.resolve(path)?).await
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.resolve(path)?, data).await
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(path)?).await
    }

    async fn unlink(&self, path: &str) -> io::Result<()> {
        tokio::fs::remove_file(self.resolve(path)?).await
    }
}
