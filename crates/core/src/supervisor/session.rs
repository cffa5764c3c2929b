//! The session supervisor: one engine, one command at a time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::SupervisorConfig;
use super::error::TranscodeError;
use super::job::{default_flags, EngineCommand, TranscodeJob};
use super::observers::Observers;
use super::state::{RunState, StateCell};
use crate::config::Config;
use crate::engine::{
    AssetLocator, EngineBootstrap, EngineError, EngineLifecycle, LineSink, LogStream,
    ProcessBootstrap,
};
use crate::log_events::{CompletionMarker, CompletionOutcome, LogEvent, LogExtractor};
use crate::vfs::FsBridge;

/// Failure text a run ends with when the engine is force-disposed under it.
const FORCE_DISPOSED: &str = "engine force-disposed while the command was running";

/// Per-run state shared with the engine's log sinks.
struct JobContext {
    extractor: LogExtractor,
    pending: Option<oneshot::Sender<CompletionMarker>>,
    finished: bool,
    interrupted: bool,
}

impl JobContext {
    fn new() -> Self {
        Self {
            extractor: LogExtractor::new(),
            pending: None,
            finished: false,
            interrupted: false,
        }
    }

    /// Ends the run with a synthetic failure marker. Returns false if it had
    /// already finished.
    fn interrupt(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        self.interrupted = true;
        if let Some(slot) = self.pending.take() {
            let _ = slot.send(CompletionMarker {
                outcome: CompletionOutcome::Failure,
                line: FORCE_DISPOSED.to_string(),
            });
        }
        true
    }
}

fn lock(context: &Mutex<JobContext>) -> MutexGuard<'_, JobContext> {
    context.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Classifies one engine line and routes the resulting event.
///
/// Observers are invoked after the context lock is released.
fn handle_line(context: &Mutex<JobContext>, observers: &Observers, stream: LogStream, line: &str) {
    observers.log(stream, line);

    let mut ctx = lock(context);
    if ctx.finished {
        return;
    }
    let had_duration = ctx.extractor.active_duration().is_some();
    let event = ctx.extractor.ingest(line);
    match event {
        LogEvent::Duration(event) => {
            let adopted = !had_duration && ctx.extractor.active_duration().is_some();
            drop(ctx);
            if adopted {
                debug!(duration_secs = event.total_secs, "Engine reported media duration");
                observers.duration(event.total_secs);
            }
        }
        LogEvent::Progress(event) => {
            drop(ctx);
            observers.progress(event.observed_value());
        }
        LogEvent::Completion(marker) => {
            let Some(slot) = ctx.pending.take() else {
                return;
            };
            ctx.finished = true;
            drop(ctx);
            debug!(success = marker.is_success(), line = %marker.line, "Engine completion marker");
            if marker.is_success() {
                observers.progress(100.0);
            }
            let _ = slot.send(marker);
        }
        LogEvent::Unrecognized => {}
    }
}

/// Single-flight transcoding service over one engine instance at a time.
///
/// Every [`run`](Self::run) loads a fresh engine, stages the inputs, executes
/// the command, waits for a completion marker in the engine log, retrieves
/// the output, and disposes the engine before returning. A second `run`
/// while one is in flight fails immediately with
/// [`TranscodeError::AlreadyRunning`].
///
/// `run` has no internal timeout: an engine that never prints a completion
/// marker keeps it pending. Use [`run_with_timeout`](Self::run_with_timeout)
/// to bound it.
pub struct Supervisor {
    config: SupervisorConfig,
    lifecycle: tokio::sync::Mutex<EngineLifecycle>,
    state: StateCell,
    observers: Observers,
    last_handle: Mutex<Option<Uuid>>,
    // Reachable without the lifecycle lock, which a hung run keeps held.
    current: Mutex<Option<Arc<Mutex<JobContext>>>>,
}

impl Supervisor {
    /// Creates a supervisor loading engines through `bootstrap`.
    pub fn new(bootstrap: Arc<dyn EngineBootstrap>, config: SupervisorConfig) -> Self {
        Self::with_lifecycle(
            EngineLifecycle::new(bootstrap, AssetLocator::default()),
            config,
        )
    }

    /// Creates a supervisor around an existing lifecycle manager.
    pub fn with_lifecycle(lifecycle: EngineLifecycle, config: SupervisorConfig) -> Self {
        Self {
            config,
            lifecycle: tokio::sync::Mutex::new(lifecycle),
            state: StateCell::new(RunState::Idle),
            observers: Observers::default(),
            last_handle: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    /// Creates a supervisor driving the configured engine program.
    pub fn from_config(config: &Config) -> Self {
        let bootstrap = Arc::new(ProcessBootstrap::new(config.engine.clone()));
        let locator = AssetLocator::new(&config.engine.assets);
        Self::with_lifecycle(
            EngineLifecycle::new(bootstrap, locator),
            config.supervisor.clone(),
        )
    }

    /// Attaches telemetry observers.
    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Id of the most recently created engine handle.
    pub fn last_handle_id(&self) -> Option<Uuid> {
        *self
            .last_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The complete argument list passed to the engine for `command`.
    pub fn full_args(&self, command: &EngineCommand) -> Vec<String> {
        let mut args = default_flags(self.config.stats_period_secs);
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(command.args().iter().cloned());
        args
    }

    /// Runs one job and returns the output file's bytes.
    pub async fn run(&self, job: TranscodeJob) -> Result<Vec<u8>, TranscodeError> {
        let _flight = self.state.begin().map_err(|blocking| {
            debug!(state = %blocking, "Rejecting run while another is in flight");
            TranscodeError::AlreadyRunning
        })?;
        let started = Instant::now();
        let context = Arc::new(Mutex::new(JobContext::new()));
        *self.current_slot() = Some(Arc::clone(&context));
        let mut lifecycle = self.lifecycle.lock().await;

        let handle_id = match lifecycle
            .initialize(
                self.sink(&context, LogStream::Out),
                self.sink(&context, LogStream::Err),
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Engine initialization failed");
                self.current_slot().take();
                self.state.set(RunState::Failed);
                return Err(TranscodeError::EngineUnavailable(e));
            }
        };
        *self
            .last_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle_id);
        self.state.set(RunState::Ready);

        let outcome = self.execute(&mut lifecycle, &context, &job).await;

        self.state.set(RunState::Completing);
        let bridge = lifecycle.handle().map(|handle| FsBridge::new(handle.fs()));
        let result = match (outcome, bridge.as_ref()) {
            (Ok(marker), Some(bridge)) if marker.is_success() => bridge
                .read_file(&job.output_path)
                .await
                .map_err(TranscodeError::OutputRetrieveFailed),
            (Ok(marker), _) if marker.is_success() => Err(TranscodeError::EngineUnavailable(
                EngineError::NotInitialized,
            )),
            (Ok(marker), _) => Err(TranscodeError::run_failed(marker.line)),
            (Err(e), _) => Err(e),
        };

        if let Some(bridge) = bridge {
            for input in &job.inputs {
                bridge.delete_file(&input.path).await;
            }
            bridge.delete_file(&job.output_path).await;
        }
        lifecycle.dispose();
        self.current_slot().take();
        self.state.set(RunState::Idle);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(bytes) => info!(
                handle = %handle_id,
                output_bytes = bytes.len(),
                elapsed_ms,
                "Transcode completed"
            ),
            Err(e) => warn!(handle = %handle_id, error = %e, elapsed_ms, "Transcode failed"),
        }
        result
    }

    /// Runs one job, force-disposing the engine if it exceeds `limit`.
    pub async fn run_with_timeout(
        &self,
        job: TranscodeJob,
        limit: Duration,
    ) -> Result<Vec<u8>, TranscodeError> {
        match tokio::time::timeout(limit, self.run(job)).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = limit.as_millis() as u64;
                warn!(timeout_ms, "Transcode timed out, disposing engine");
                self.force_dispose().await;
                Err(TranscodeError::Timeout { timeout_ms })
            }
        }
    }

    /// Disposes any live engine instance, treating it as unrecoverable.
    ///
    /// A run in flight is ended first: it fails with
    /// [`TranscodeError::RunFailed`] and releases the engine, which is then
    /// disposed. The supervisor is left `Disposed` and accepts new runs.
    pub async fn force_dispose(&self) {
        let interrupted = match self.current_slot().take() {
            Some(context) => lock(&context).interrupt(),
            None => false,
        };
        if interrupted {
            debug!("Interrupted in-flight run for forced disposal");
        }

        let mut lifecycle = self.lifecycle.lock().await;
        let was_loaded = lifecycle.is_loaded();
        lifecycle.dispose();
        // A run claimed after the interrupted one keeps its state.
        if (was_loaded || interrupted) && !self.state.get().is_in_flight() {
            self.state.set(RunState::Disposed);
        }
    }

    fn current_slot(&self) -> MutexGuard<'_, Option<Arc<Mutex<JobContext>>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stages inputs, starts the command, and waits for its completion marker.
    async fn execute(
        &self,
        lifecycle: &mut EngineLifecycle,
        context: &Arc<Mutex<JobContext>>,
        job: &TranscodeJob,
    ) -> Result<CompletionMarker, TranscodeError> {
        let handle = lifecycle
            .handle_mut()
            .ok_or(TranscodeError::EngineUnavailable(EngineError::NotInitialized))?;

        let bridge = FsBridge::new(handle.fs());
        for input in &job.inputs {
            bridge
                .write_file(&input.path, &input.bytes)
                .await
                .map_err(TranscodeError::InputStageFailed)?;
        }

        let (slot, completion) = oneshot::channel();
        {
            let mut ctx = lock(context);
            if ctx.interrupted {
                return Err(TranscodeError::run_failed(FORCE_DISPOSED));
            }
            ctx.pending = Some(slot);
        }

        let args = self.full_args(&job.command);
        self.state.set(RunState::Running);
        info!(handle = %handle.id(), args = %args.join(" "), "Running engine command");
        if let Err(e) = handle.call_main(&args) {
            lock(context).pending = None;
            return Err(TranscodeError::run_failed(e.to_string()));
        }

        completion.await.map_err(|_| {
            TranscodeError::run_failed("engine released its log sinks without a completion marker")
        })
    }

    fn sink(&self, context: &Arc<Mutex<JobContext>>, stream: LogStream) -> LineSink {
        let context = Arc::clone(context);
        let observers = self.observers.clone();
        Arc::new(move |line| handle_line(&context, &observers, stream, line))
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("state", &self.state.get())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
