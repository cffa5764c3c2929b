//! Testing utilities: an in-process engine and namespace.
//!
//! [`ScriptedBootstrap`] loads [`ScriptedEngine`] instances that replay a
//! fixed log transcript from a background task, the way a real engine emits
//! output asynchronously. Each instance gets a fresh [`MemoryFs`].
//!
//! # Example
//!
//! ```rust,ignore
//! use transcoder_core::testing::{EngineScript, ScriptedBootstrap};
//!
//! let bootstrap = ScriptedBootstrap::new().with_script(EngineScript::hang());
//! bootstrap.set_call_error(Some("entry point threw".to_string()));
//! ```

mod memory_fs;
mod scripted_engine;

pub use memory_fs::MemoryFs;
pub use scripted_engine::{EngineScript, LoadFailure, ScriptedBootstrap, ScriptedEngine};
