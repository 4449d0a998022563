//! Validation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a reason was rejected. One variant per pipeline stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Shorter than the minimum length.
    TooShort,
    /// A character repeats in a run, or dominates the text.
    RepeatedCharacter,
    /// Nothing left once links are removed.
    OnlyLink,
    /// One word dominates the text.
    RepeatedWords,
    /// Adjacent-key runs make up too much of the text.
    KeyboardMash,
    /// Too many words have no vowel or long consonant runs.
    NotRealWords,
    /// Too few distinct words.
    LowDiversity,
}

impl Rejection {
    /// The message shown to the user for this rejection.
    ///
    /// [`Rejection::TooShort`] is rendered by the validator itself because
    /// it names the configured minimum.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::TooShort => "Please write a longer reason",
            Self::RepeatedCharacter => "Avoid repeating the same character",
            Self::OnlyLink => "Please explain in your own words, not just a link",
            Self::RepeatedWords => "Try to vary your words instead of repeating",
            Self::KeyboardMash => "That looks like keyboard mashing, not a real reason",
            Self::NotRealWords => "Your reason should contain real words",
            Self::LowDiversity => "Please write a more varied explanation",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of one validation call.
///
/// `errors` holds at most one message: the pipeline stops at the first
/// failing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the text is an acceptable reason.
    pub valid: bool,
    /// Human-readable messages, in pipeline order.
    pub errors: Vec<String>,
    /// The stage that rejected the text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl ValidationResult {
    /// An accepted reason.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            rejection: None,
        }
    }

    /// A rejection with its standard message.
    #[must_use]
    pub fn rejected(rejection: Rejection) -> Self {
        Self::rejected_with(rejection, rejection.message())
    }

    /// A rejection with a custom message.
    #[must_use]
    pub fn rejected_with(rejection: Rejection, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![message.into()],
            rejection: Some(rejection),
        }
    }
}
