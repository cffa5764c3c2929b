//! Engine module: loading, driving, and disposing media engine instances.
//!
//! An engine instance is created through an [`EngineBootstrap`], owned by an
//! [`EngineLifecycle`], and executes exactly one command before it has to be
//! disposed. [`ProcessBootstrap`] drives an ffmpeg-compatible program as a
//! child process with a private scratch directory as its namespace.

mod config;
mod error;
mod lifecycle;
mod locator;
mod process;
mod traits;

pub use config::{AssetsConfig, EngineConfig};
pub use error::EngineError;
pub use lifecycle::{EngineHandle, EngineLifecycle};
pub use locator::AssetLocator;
pub use process::{DirFs, ProcessBootstrap, ProcessEngine};
pub use traits::{
    EngineBootstrap, EngineFs, EngineHooks, EngineModule, LineSink, LogStream, PathResolver,
};
