//! Configuration for the engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for loading engine instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine program to launch (bare name looked up on PATH, or a path).
    #[serde(default = "default_program")]
    pub program: String,

    /// Directory under which each instance gets its private namespace.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Auxiliary asset resolution.
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Where the engine's auxiliary assets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Suffix identifying the worker script.
    #[serde(default = "default_worker_suffix")]
    pub worker_suffix: String,

    /// Suffix identifying the binary payload.
    #[serde(default = "default_binary_suffix")]
    pub binary_suffix: String,

    /// Location of the worker script. Unset means pass through.
    #[serde(default)]
    pub worker_path: Option<PathBuf>,

    /// Location of the binary payload. Unset means pass through.
    #[serde(default)]
    pub binary_path: Option<PathBuf>,
}

fn default_program() -> String {
    "ffmpeg".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("transcoder-engine")
}

fn default_worker_suffix() -> String {
    ".worker.js".to_string()
}

fn default_binary_suffix() -> String {
    ".wasm".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            temp_dir: default_temp_dir(),
            assets: AssetsConfig::default(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            worker_suffix: default_worker_suffix(),
            binary_suffix: default_binary_suffix(),
            worker_path: None,
            binary_path: None,
        }
    }
}

impl EngineConfig {
    /// Creates a config launching the given program.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Sets the temp directory.
    pub fn with_temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// Sets the binary payload location.
    pub fn with_binary_path(mut self, path: PathBuf) -> Self {
        self.assets.binary_path = Some(path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.program, "ffmpeg");
        assert!(config.temp_dir.ends_with("transcoder-engine"));
        assert_eq!(config.assets.worker_suffix, ".worker.js");
        assert_eq!(config.assets.binary_suffix, ".wasm");
        assert!(config.assets.binary_path.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::with_program("/opt/ffmpeg/bin/ffmpeg")
            .with_temp_dir(PathBuf::from("/tmp/test"))
            .with_binary_path(PathBuf::from("/opt/ffmpeg/ffmpeg.core.wasm"));

        assert_eq!(config.program, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.temp_dir, PathBuf::from("/tmp/test"));
        assert_eq!(
            config.assets.binary_path,
            Some(PathBuf::from("/opt/ffmpeg/ffmpeg.core.wasm"))
        );
    }

    #[test]
    fn test_config_deserializes_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
program = "avconv"

[assets]
binary_suffix = ".bin"
"#,
        )
        .unwrap();
        assert_eq!(config.program, "avconv");
        assert_eq!(config.assets.binary_suffix, ".bin");
        assert_eq!(config.assets.worker_suffix, ".worker.js");
    }
}
