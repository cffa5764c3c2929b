//! Creation and disposal of engine instances.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::EngineError;
use super::locator::AssetLocator;
use super::traits::{EngineBootstrap, EngineFs, EngineHooks, EngineModule, LineSink};

/// Exclusive ownership of one live engine instance.
pub struct EngineHandle {
    id: Uuid,
    module: Box<dyn EngineModule>,
}

impl EngineHandle {
    /// Unique id of this instance. Never reused across instances.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The instance's virtual filesystem.
    pub fn fs(&self) -> Arc<dyn EngineFs> {
        self.module.fs()
    }

    /// Starts a command on the instance.
    pub fn call_main(&mut self, args: &[String]) -> Result<(), EngineError> {
        self.module.call_main(args)
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Owns at most one engine instance at a time.
///
/// Every [`initialize`](Self::initialize) produces a fresh instance; a
/// previously loaded one is disposed first. Disposal never fails from the
/// caller's point of view.
pub struct EngineLifecycle {
    bootstrap: Option<Arc<dyn EngineBootstrap>>,
    locator: AssetLocator,
    current: Option<EngineHandle>,
}

impl EngineLifecycle {
    /// Creates a manager that loads instances through `bootstrap`.
    pub fn new(bootstrap: Arc<dyn EngineBootstrap>, locator: AssetLocator) -> Self {
        Self {
            bootstrap: Some(bootstrap),
            locator,
            current: None,
        }
    }

    /// Creates a manager for a host that exposes no engine entry point.
    pub fn unavailable() -> Self {
        Self {
            bootstrap: None,
            locator: AssetLocator::default(),
            current: None,
        }
    }

    /// Loads a fresh instance wired to the given output sinks.
    pub async fn initialize(
        &mut self,
        print: LineSink,
        print_err: LineSink,
    ) -> Result<Uuid, EngineError> {
        if self.current.is_some() {
            debug!("Disposing previous engine instance before re-initializing");
            self.dispose();
        }

        let bootstrap = self.bootstrap.as_ref().ok_or_else(|| {
            EngineError::bootstrap_unavailable("no engine entry point registered")
        })?;

        let hooks = EngineHooks {
            print,
            print_err,
            locate_file: self.locator.clone().into_resolver(),
        };

        let module = bootstrap.load(hooks).await.map_err(|e| match e {
            EngineError::BootstrapUnavailable { .. } | EngineError::InitFailed { .. } => e,
            other => EngineError::init_failed(other.to_string()),
        })?;

        let id = Uuid::new_v4();
        info!(engine = bootstrap.name(), handle = %id, "Engine instance loaded");
        self.current = Some(EngineHandle { id, module });
        Ok(id)
    }

    /// The live instance, if any.
    pub fn handle(&self) -> Option<&EngineHandle> {
        self.current.as_ref()
    }

    /// The live instance, if any.
    pub fn handle_mut(&mut self) -> Option<&mut EngineHandle> {
        self.current.as_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Shuts down the live instance, if any. Errors are logged, not returned.
    pub fn dispose(&mut self) {
        let Some(mut handle) = self.current.take() else {
            return;
        };
        match handle.module.exit() {
            Ok(()) => debug!(handle = %handle.id, "Engine instance disposed"),
            Err(e) => warn!(handle = %handle.id, error = %e, "Error disposing engine instance"),
        }
    }
}

impl Drop for EngineLifecycle {
    fn drop(&mut self) {
        self.dispose();
    }
}
