//! Scripted in-process engine for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::memory_fs::MemoryFs;
use crate::engine::{EngineBootstrap, EngineError, EngineFs, EngineHooks, EngineModule, LogStream};

/// How a scripted load should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    /// Behave as if the host exposes no engine.
    Unavailable,
    /// Behave as if the engine threw while loading.
    InitFailed,
}

/// What a scripted engine does when its entry point is called.
#[derive(Debug, Clone, Default)]
pub struct EngineScript {
    /// Lines emitted, in order, after the command starts.
    pub lines: Vec<(LogStream, String)>,
    /// File the engine "produces" before emitting any line.
    pub output: Option<(String, Vec<u8>)>,
    /// Pause before each line. Zero yields to the scheduler instead.
    pub line_delay: Duration,
}

impl EngineScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ten second input transcoded successfully into `output_path`.
    pub fn success(output_path: impl Into<String>, output: Vec<u8>) -> Self {
        Self::new()
            .with_err("Input #0, wav, from 'input.wav':")
            .with_err("  Duration: 00:00:10.00, bitrate: 1411 kb/s")
            .with_err("  Stream #0:0: Audio: pcm_s16le ([1][0][0][0] / 0x0001), 44100 Hz, 2 channels, s16, 1411 kb/s")
            .with_err("size=     128kB time=00:00:05.00 bitrate= 209.7kbits/s speed=10.0x")
            .with_err("size=     256kB time=00:00:10.00 bitrate= 209.7kbits/s speed=10.0x")
            .with_err("video:0kB audio:256kB subtitle:0kB other streams:0kB global headers:0kB muxing overhead: 0.089%")
            .with_output(output_path, output)
    }

    /// A run that ends with the given failure line and produces nothing.
    pub fn failure(line: impl Into<String>) -> Self {
        Self::new()
            .with_err("Input #0, wav, from 'input.wav':")
            .with_err(line)
    }

    /// A run that reports progress but never completes.
    pub fn hang() -> Self {
        Self::new()
            .with_err("  Duration: 00:00:10.00, bitrate: 1411 kb/s")
            .with_err("size=     128kB time=00:00:05.00 bitrate= 209.7kbits/s speed=10.0x")
    }

    /// Appends a line.
    pub fn with_line(mut self, stream: LogStream, line: impl Into<String>) -> Self {
        self.lines.push((stream, line.into()));
        self
    }

    /// Appends a standard-error line.
    pub fn with_err(self, line: impl Into<String>) -> Self {
        self.with_line(LogStream::Err, line)
    }

    /// Sets the produced output file.
    pub fn with_output(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.output = Some((path.into(), bytes));
        self
    }

    /// Sets the pause before each line.
    pub fn with_line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct BootstrapState {
    script: EngineScript,
    load_failure: Option<LoadFailure>,
    call_error: Option<String>,
    exit_error: bool,
    loads: usize,
    exits: usize,
    last_args: Option<Vec<String>>,
    last_fs: Option<Arc<MemoryFs>>,
    located_assets: Vec<String>,
}

/// Bootstrap producing [`ScriptedEngine`] instances.
///
/// Clones share state, so a test can keep one clone for assertions while the
/// supervisor owns another.
///
/// # Example
///
/// ```rust,ignore
/// use transcoder_core::testing::{EngineScript, ScriptedBootstrap};
///
/// let bootstrap = ScriptedBootstrap::new()
///     .with_script(EngineScript::success("output.mp3", b"ID3".to_vec()));
/// let supervisor = Supervisor::new(Arc::new(bootstrap.clone()), SupervisorConfig::default());
///
/// supervisor.run(job).await?;
/// assert_eq!(bootstrap.live_instances(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedBootstrap {
    state: Arc<Mutex<BootstrapState>>,
}

impl ScriptedBootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BootstrapState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the script used by instances loaded from now on.
    pub fn with_script(self, script: EngineScript) -> Self {
        self.set_script(script);
        self
    }

    /// Sets the script used by instances loaded from now on.
    pub fn set_script(&self, script: EngineScript) {
        self.state().script = script;
    }

    /// Makes subsequent loads fail.
    pub fn set_load_failure(&self, failure: Option<LoadFailure>) {
        self.state().load_failure = failure;
    }

    /// Makes the entry point of subsequently loaded instances throw.
    pub fn set_call_error(&self, error: Option<String>) {
        self.state().call_error = error;
    }

    /// Makes instance shutdown report an error.
    pub fn set_exit_error(&self, fail: bool) {
        self.state().exit_error = fail;
    }

    /// Number of successful loads.
    pub fn load_count(&self) -> usize {
        self.state().loads
    }

    /// Number of instances shut down.
    pub fn exit_count(&self) -> usize {
        self.state().exits
    }

    /// Instances loaded and not yet shut down.
    pub fn live_instances(&self) -> usize {
        let state = self.state();
        state.loads - state.exits
    }

    /// Arguments of the most recent entry point call.
    pub fn last_args(&self) -> Option<Vec<String>> {
        self.state().last_args.clone()
    }

    /// Namespace of the most recently loaded instance. Kept after shutdown
    /// so tests can inspect what was left behind.
    pub fn last_fs(&self) -> Option<Arc<MemoryFs>> {
        self.state().last_fs.clone()
    }

    /// Asset paths resolved by the most recent load.
    pub fn located_assets(&self) -> Vec<String> {
        self.state().located_assets.clone()
    }
}

#[async_trait]
impl EngineBootstrap for ScriptedBootstrap {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn load(&self, hooks: EngineHooks) -> Result<Box<dyn EngineModule>, EngineError> {
        let mut state = self.state();
        match state.load_failure {
            Some(LoadFailure::Unavailable) => {
                return Err(EngineError::bootstrap_unavailable("scripted engine unavailable"))
            }
            Some(LoadFailure::InitFailed) => {
                return Err(EngineError::init_failed("scripted engine failed to load"))
            }
            None => {}
        }

        state.located_assets = vec![
            (hooks.locate_file)("ffmpeg-core.worker.js"),
            (hooks.locate_file)("ffmpeg-core.wasm"),
        ];
        let fs = Arc::new(MemoryFs::new());
        state.last_fs = Some(Arc::clone(&fs));
        state.loads += 1;

        Ok(Box::new(ScriptedEngine {
            fs,
            hooks,
            script: state.script.clone(),
            call_error: state.call_error.clone(),
            bootstrap: self.clone(),
            task: None,
            exited: false,
        }))
    }
}

/// An engine instance that replays an [`EngineScript`] asynchronously.
pub struct ScriptedEngine {
    fs: Arc<MemoryFs>,
    hooks: EngineHooks,
    script: EngineScript,
    call_error: Option<String>,
    bootstrap: ScriptedBootstrap,
    task: Option<JoinHandle<()>>,
    exited: bool,
}

impl EngineModule for ScriptedEngine {
    fn fs(&self) -> Arc<dyn EngineFs> {
        self.fs.clone()
    }

    fn call_main(&mut self, args: &[String]) -> Result<(), EngineError> {
        self.bootstrap.state().last_args = Some(args.to_vec());
        if let Some(ref error) = self.call_error {
            return Err(EngineError::call_failed(error.clone()));
        }

        let fs = Arc::clone(&self.fs);
        let hooks = self.hooks.clone();
        let script = self.script.clone();
        self.task = Some(tokio::spawn(async move {
            if let Some((path, bytes)) = script.output {
                fs.insert_file(&path, bytes);
            }
            for (stream, line) in script.lines {
                if script.line_delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(script.line_delay).await;
                }
                hooks.emit(stream, &line);
            }
        }));
        Ok(())
    }

    fn exit(&mut self) -> Result<(), EngineError> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.exited {
            return Ok(());
        }
        self.exited = true;

        let mut state = self.bootstrap.state();
        state.exits += 1;
        if state.exit_error {
            return Err(EngineError::exit_failed("scripted engine refused to exit"));
        }
        Ok(())
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
