//! The validation pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ConfigError, ValidatorConfig};
use crate::result::{Rejection, ValidationResult};
use crate::tables::{KEYBOARD_SEQUENCES, STOPWORDS, VOWELS, is_latin_adjacent};

#[allow(clippy::expect_used)]
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("invalid regex"));

/// Validate `text` with the default thresholds.
#[must_use]
pub fn validate(text: &str) -> ValidationResult {
    ReasonValidator::default().validate(text)
}

/// Ordered heuristic checks over a free-text reason.
#[derive(Debug, Clone, Default)]
pub struct ReasonValidator {
    config: ValidatorConfig,
}

impl ReasonValidator {
    /// Create a validator with the given thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is out of range.
    pub fn new(config: ValidatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The thresholds in use.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run the pipeline. The first failing stage decides the result.
    #[must_use]
    pub fn validate(&self, text: &str) -> ValidationResult {
        let trimmed = text.trim();
        let length = trimmed.chars().count();

        if length < self.config.min_chars {
            return ValidationResult::rejected_with(
                Rejection::TooShort,
                format!("Please write at least {} characters", self.config.min_chars),
            );
        }

        if self.has_char_run(trimmed) || self.has_dominant_char(trimmed) {
            return ValidationResult::rejected(Rejection::RepeatedCharacter);
        }

        // Heuristics below assume space-separated Latin words.
        let non_latin = trimmed.chars().filter(|c| !is_latin_adjacent(*c)).count();
        if share(non_latin, length) > self.config.non_latin_share {
            return ValidationResult::accepted();
        }

        let stripped = URL_RE.replace_all(trimmed, "");
        let lowered = stripped.trim().to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        if words.is_empty() {
            return ValidationResult::rejected(Rejection::OnlyLink);
        }

        if self.has_repeated_word(&words) {
            return ValidationResult::rejected(Rejection::RepeatedWords);
        }

        if self.is_keyboard_mash(trimmed) {
            return ValidationResult::rejected(Rejection::KeyboardMash);
        }

        if self.lacks_real_words(&words) {
            return ValidationResult::rejected(Rejection::NotRealWords);
        }

        if words.len() >= self.config.diversity_min_words {
            let unique: HashSet<&str> = words.iter().copied().collect();
            if share(unique.len(), words.len()) < self.config.min_diversity {
                return ValidationResult::rejected(Rejection::LowDiversity);
            }
        }

        ValidationResult::accepted()
    }

    /// A case-sensitive run of identical characters. Line breaks end a run.
    fn has_char_run(&self, text: &str) -> bool {
        let mut previous = None;
        let mut run = 0usize;
        for c in text.chars() {
            if is_line_terminator(c) {
                previous = None;
                run = 0;
                continue;
            }
            if previous == Some(c) {
                run = run.saturating_add(1);
            } else {
                previous = Some(c);
                run = 1;
            }
            if run >= self.config.max_char_run {
                return true;
            }
        }
        false
    }

    fn has_dominant_char(&self, text: &str) -> bool {
        let mut counts: HashMap<char, usize> = HashMap::new();
        let mut total = 0usize;
        for c in text.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase) {
            let n = counts.entry(c).or_default();
            *n = n.saturating_add(1);
            total = total.saturating_add(1);
        }
        counts
            .values()
            .any(|&n| share(n, total) > self.config.max_char_share)
    }

    fn has_repeated_word(&self, words: &[&str]) -> bool {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in words.iter().copied().filter(|w| !STOPWORDS.contains(w)) {
            let n = counts.entry(word).or_default();
            *n = n.saturating_add(1);
        }
        counts.values().any(|&n| {
            n > self.config.word_repeat_count && share(n, words.len()) > self.config.word_repeat_share
        })
    }

    /// Slides a window over the whitespace-free text. Flags the text when
    /// either the share of matching windows or the share of characters
    /// covered by letter-row windows is too high; back-to-back repeats of
    /// one run only match at a few offsets but still cover most of the text.
    fn is_keyboard_mash(&self, text: &str) -> bool {
        let chars: Vec<char> = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        let width = self.config.mash_window;
        if chars.len() < width {
            return false;
        }

        let mut covered = vec![false; chars.len()];
        let mut hits = 0usize;
        let mut windows = 0usize;
        for (start, window) in chars.windows(width).enumerate() {
            windows = windows.saturating_add(1);
            let candidate: String = window.iter().collect();
            if KEYBOARD_SEQUENCES.contains(&candidate.as_str()) {
                hits = hits.saturating_add(1);
                if window.iter().all(char::is_ascii_alphabetic) {
                    for flag in covered.iter_mut().skip(start).take(width) {
                        *flag = true;
                    }
                }
            }
        }

        let covered = covered.iter().filter(|c| **c).count();
        share(hits, windows) > self.config.mash_share
            || share(covered, chars.len()) > self.config.mash_share
    }

    fn lacks_real_words(&self, words: &[&str]) -> bool {
        let mut long = 0usize;
        let mut bad = 0usize;
        for word in words {
            let letters: Vec<char> = word.chars().filter(char::is_ascii_lowercase).collect();
            if letters.len() < self.config.long_word_len {
                continue;
            }
            long = long.saturating_add(1);
            if !self.looks_real(&letters) {
                bad = bad.saturating_add(1);
            }
        }
        long > 0 && share(bad, long) > self.config.bad_word_share
    }

    fn looks_real(&self, letters: &[char]) -> bool {
        if !letters.iter().any(|c| VOWELS.contains(c)) {
            return false;
        }
        let mut run = 0usize;
        for c in letters {
            if VOWELS.contains(c) {
                run = 0;
            } else {
                run = run.saturating_add(1);
                if run >= self.config.consonant_run {
                    return false;
                }
            }
        }
        true
    }
}

/// Characters that end a run, matching the line terminators of a regex `.`.
fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[allow(clippy::cast_precision_loss)]
fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
