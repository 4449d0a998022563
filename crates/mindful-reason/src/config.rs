//! Tuning constants for the validator pipeline.
//!
//! The defaults are empirical. They are kept configurable rather than
//! re-derived; every field maps to one stage of the pipeline.

use serde::{Deserialize, Serialize};

/// A threshold outside its allowed range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid validator setting '{field}': {message}")]
pub struct ConfigError {
    /// Name of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

/// Thresholds for every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Minimum trimmed length, in characters.
    pub min_chars: usize,
    /// A run of this many identical characters is rejected.
    pub max_char_run: usize,
    /// Maximum share of non-whitespace text one character may take.
    pub max_char_share: f64,
    /// Above this share of non-Latin characters the word checks are skipped.
    pub non_latin_share: f64,
    /// A non-stop word must occur more than this many times to count as repeated...
    pub word_repeat_count: usize,
    /// ...and also exceed this share of all words.
    pub word_repeat_share: f64,
    /// Width of the keyboard-mash sliding window.
    pub mash_window: usize,
    /// Maximum share of mash windows (and of characters they cover).
    pub mash_share: f64,
    /// Words with at least this many letters are shape-checked.
    pub long_word_len: usize,
    /// A run of this many consonants marks a word as not real.
    pub consonant_run: usize,
    /// Maximum share of long words that may fail the shape check.
    pub bad_word_share: f64,
    /// The diversity check only applies from this many words on.
    pub diversity_min_words: usize,
    /// Minimum ratio of distinct words to total words.
    pub min_diversity: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_chars: 30,
            max_char_run: 4,
            max_char_share: 0.4,
            non_latin_share: 0.5,
            word_repeat_count: 3,
            word_repeat_share: 0.3,
            mash_window: 5,
            mash_share: 0.3,
            long_word_len: 4,
            consonant_run: 5,
            bad_word_share: 0.5,
            diversity_min_words: 5,
            min_diversity: 0.4,
        }
    }
}

impl ValidatorConfig {
    /// Check every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns the first field that is zero where a count is required, or a
    /// share outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("min_chars", self.min_chars),
            ("max_char_run", self.max_char_run),
            ("mash_window", self.mash_window),
            ("long_word_len", self.long_word_len),
            ("consonant_run", self.consonant_run),
            ("diversity_min_words", self.diversity_min_words),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigError {
                    field,
                    message: "must be at least 1".to_owned(),
                });
            }
        }
        if self.max_char_run < 2 {
            return Err(ConfigError {
                field: "max_char_run",
                message: "must be at least 2".to_owned(),
            });
        }

        let shares = [
            ("max_char_share", self.max_char_share),
            ("non_latin_share", self.non_latin_share),
            ("word_repeat_share", self.word_repeat_share),
            ("mash_share", self.mash_share),
            ("bad_word_share", self.bad_word_share),
            ("min_diversity", self.min_diversity),
        ];
        for (field, value) in shares {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(ConfigError {
                    field,
                    message: format!("{value} is out of range; must be in (0, 1]"),
                });
            }
        }
        Ok(())
    }
}
