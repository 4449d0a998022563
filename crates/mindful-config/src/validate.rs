//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server(config)?;
    validate_scheduler(config)?;
    validate_validator(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    if config.server.port == 0 {
        return Err(invalid("server.port", "port must be between 1 and 65535"));
    }
    if config.server.bind.trim().is_empty() {
        return Err(invalid("server.bind", "bind address must not be empty"));
    }
    Ok(())
}

fn validate_scheduler(config: &Config) -> ConfigResult<()> {
    if config.scheduler.sweep_interval_ms == 0 {
        return Err(invalid(
            "scheduler.sweep_interval_ms",
            "sweep interval must be at least 1 ms",
        ));
    }
    Ok(())
}

fn validate_validator(config: &Config) -> ConfigResult<()> {
    let v = &config.validator;

    let counts = [
        ("validator.min_chars", v.min_chars),
        ("validator.max_char_run", v.max_char_run),
        ("validator.word_repeat_count", v.word_repeat_count),
        ("validator.mash_window", v.mash_window),
        ("validator.long_word_len", v.long_word_len),
        ("validator.consonant_run", v.consonant_run),
        ("validator.diversity_min_words", v.diversity_min_words),
    ];
    for (field, value) in counts {
        if value == 0 {
            return Err(invalid(field, "must be at least 1"));
        }
    }
    if v.max_char_run < 2 {
        return Err(invalid("validator.max_char_run", "must be at least 2"));
    }

    let shares = [
        ("validator.max_char_share", v.max_char_share),
        ("validator.non_latin_share", v.non_latin_share),
        ("validator.word_repeat_share", v.word_repeat_share),
        ("validator.mash_share", v.mash_share),
        ("validator.bad_word_share", v.bad_word_share),
        ("validator.min_diversity", v.min_diversity),
    ];
    for (field, value) in shares {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            return Err(invalid(
                field,
                format!("{value} is out of range; must be in (0, 1]"),
            ));
        }
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    if !matches!(
        l.level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected trace, debug, info, warn or error",
                l.level
            ),
        ));
    }
    if !matches!(
        l.format.to_ascii_lowercase().as_str(),
        "pretty" | "compact" | "json" | "full"
    ) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected pretty, compact, json or full",
                l.format
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_sweep_interval() {
        let mut config = Config::default();
        config.scheduler.sweep_interval_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_count() {
        let mut config = Config::default();
        config.validator.mash_window = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("validator.mash_window"));
    }

    #[test]
    fn test_share_out_of_range() {
        for bad in [0.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            let mut config = Config::default();
            config.validator.mash_share = bad;
            assert!(validate(&config).is_err(), "accepted {bad}");
        }
        let mut config = Config::default();
        config.validator.mash_share = 1.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_single_char_run_rejected() {
        let mut config = Config::default();
        config.validator.max_char_run = 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "yaml".to_owned();
        assert!(validate(&config).is_err());
    }
}
