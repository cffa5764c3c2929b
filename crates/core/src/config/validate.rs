use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Engine program is not empty
/// - Asset suffixes are not empty
/// - Stats period is positive
/// - Timeout, when set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Engine validation
    if config.engine.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.program cannot be empty".to_string(),
        ));
    }
    if config.engine.assets.worker_suffix.is_empty() || config.engine.assets.binary_suffix.is_empty()
    {
        return Err(ConfigError::ValidationError(
            "engine.assets suffixes cannot be empty".to_string(),
        ));
    }

    // Supervisor validation
    let period = config.supervisor.stats_period_secs;
    if !period.is_finite() || period <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "supervisor.stats_period_secs must be positive, got {}",
            period
        )));
    }
    if config.supervisor.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "supervisor.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_program_fails() {
        let mut config = Config::default();
        config.engine.program = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_stats_period() {
        let mut config = Config::default();
        config.supervisor.stats_period_secs = 0.0;
        assert!(validate_config(&config).is_err());

        config.supervisor.stats_period_secs = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.supervisor.timeout_secs = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_suffix_fails() {
        let mut config = Config::default();
        config.engine.assets.binary_suffix.clear();
        assert!(validate_config(&config).is_err());
    }
}
