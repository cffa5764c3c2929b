use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `TRANSCODER_ENGINE__TEMP_DIR`.
pub const ENV_PREFIX: &str = "TRANSCODER_";

fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load defaults with environment variable overrides only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[engine]
program = "/usr/local/bin/ffmpeg"

[supervisor]
stats_period_secs = 0.5
timeout_secs = 120
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.engine.program, "/usr/local/bin/ffmpeg");
        assert_eq!(config.supervisor.stats_period_secs, 0.5);
        assert_eq!(config.supervisor.timeout_secs, Some(120));
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.engine.program, "ffmpeg");
        assert_eq!(config.supervisor.stats_period_secs, 0.2);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[supervisor]
stats_period_secs = "fast"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[engine]
program = "avconv"
temp_dir = "/tmp/engine-test"

[engine.assets]
binary_path = "/opt/engine/core.wasm"

[supervisor]
extra_args = ["-threads", "1"]
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.engine.program, "avconv");
        assert_eq!(
            config.engine.temp_dir.to_string_lossy(),
            "/tmp/engine-test"
        );
        assert_eq!(
            config.engine.assets.binary_path.as_deref().map(|p| p.to_string_lossy().to_string()),
            Some("/opt/engine/core.wasm".to_string())
        );
        assert_eq!(config.engine.assets.worker_suffix, ".worker.js");
        assert_eq!(config.supervisor.extra_args, vec!["-threads", "1"]);
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[engine]
program = "ffmpeg"
"#,
            )?;
            jail.set_env("TRANSCODER_ENGINE__PROGRAM", "/opt/bin/ffmpeg");
            jail.set_env("TRANSCODER_SUPERVISOR__TIMEOUT_SECS", "90");

            let config = load_config(Path::new("config.toml")).unwrap();
            assert_eq!(config.engine.program, "/opt/bin/ffmpeg");
            assert_eq!(config.supervisor.timeout_secs, Some(90));
            Ok(())
        });
    }
}
