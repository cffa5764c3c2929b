pub mod config;
pub mod engine;
pub mod log_events;
pub mod preset;
pub mod supervisor;
pub mod testing;
pub mod vfs;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
};
pub use engine::{
    AssetLocator, EngineBootstrap, EngineConfig, EngineError, EngineHandle, EngineLifecycle,
    LogStream, ProcessBootstrap,
};
pub use log_events::{LogEvent, LogExtractor};
pub use preset::{AudioFormat, AudioPreset};
pub use supervisor::{
    EngineCommand, Observers, RunState, StagedFile, Supervisor, SupervisorConfig, TranscodeError,
    TranscodeJob,
};
pub use vfs::{FsBridge, FsError};
