//! Mindful Reason - judges whether typed text is a genuine justification.
//!
//! The validator is an ordered pipeline of cheap heuristics. Each stage can
//! reject the text with one human-readable message; the first rejection
//! wins and later stages are not evaluated.
//!
//! 1. Minimum length
//! 2. Character repetition
//! 3. Script branch (mostly non-Latin text is accepted here)
//! 4. Tokenization (a bare link is rejected)
//! 5. Word repetition
//! 6. Keyboard-mash detection
//! 7. Real-word shape
//! 8. Word diversity
//!
//! The function is pure, so the barrier can run it on every keystroke for
//! live feedback and the gate can run it again, strictly, on submission.
//!
//! # Example
//!
//! ```
//! use mindful_reason::{Rejection, validate};
//!
//! let ok = validate("I need to check the event schedule for my team meeting tomorrow");
//! assert!(ok.valid);
//!
//! let short = validate("short");
//! assert!(!short.valid);
//! assert_eq!(short.rejection, Some(Rejection::TooShort));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod result;
pub mod tables;
pub mod validator;

pub use config::{ConfigError, ValidatorConfig};
pub use result::{Rejection, ValidationResult};
pub use validator::{ReasonValidator, validate};
