//! Bridge from `mindful_config::Config` to domain types.

use std::str::FromStr;

use mindful_config::{Config, ValidatorSection};
use mindful_reason::ValidatorConfig;
use mindful_telemetry::{LogConfig, LogFormat};

/// Logging setup for `config`.
#[must_use]
pub fn to_log_config(config: &Config) -> LogConfig {
    let logging = &config.logging;
    let format = LogFormat::from_str(&logging.format).unwrap_or_default();
    let mut log_config = LogConfig::new(logging.level.clone()).with_format(format);
    for directive in &logging.directives {
        log_config = log_config.with_directive(directive.clone());
    }
    log_config
}

/// Validator thresholds from the `[validator]` section.
#[must_use]
pub fn to_validator_config(section: &ValidatorSection) -> ValidatorConfig {
    ValidatorConfig {
        min_chars: section.min_chars,
        max_char_run: section.max_char_run,
        max_char_share: section.max_char_share,
        non_latin_share: section.non_latin_share,
        word_repeat_count: section.word_repeat_count,
        word_repeat_share: section.word_repeat_share,
        mash_window: section.mash_window,
        mash_share: section.mash_share,
        long_word_len: section.long_word_len,
        consonant_run: section.consonant_run,
        bad_word_share: section.bad_word_share,
        diversity_min_words: section.diversity_min_words,
        min_diversity: section.min_diversity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sections_match_validator_defaults() {
        let config = Config::default();
        assert_eq!(
            to_validator_config(&config.validator),
            ValidatorConfig::default()
        );
    }

    #[test]
    fn test_log_config_carries_level_format_and_directives() {
        let mut config = Config::default();
        config.logging.level = "debug".to_owned();
        config.logging.format = "json".to_owned();
        config.logging.directives = vec!["mindful_gate=trace".to_owned()];

        let log_config = to_log_config(&config);
        assert_eq!(log_config.level, "debug");
        assert_eq!(log_config.format, LogFormat::Json);
        assert_eq!(log_config.directives, vec!["mindful_gate=trace".to_owned()]);
    }
}
