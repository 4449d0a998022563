//! Mindful Test - shared test doubles for the gate.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! mindful-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use mindful_test::{TestGate, VALID_REASON};
//!
//! #[tokio::test]
//! async fn test_flow() {
//!     let mut gate = TestGate::enabled().await;
//!     gate.controller.on_navigation(tab, "https://reddit.com/").await.unwrap();
//!     assert_eq!(gate.ui.messages_for(tab).len(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
