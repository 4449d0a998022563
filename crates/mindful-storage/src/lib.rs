//! Mindful Storage - the key-value contract behind settings and schedules.
//!
//! Everything the gate persists goes through [`KvStore`]: the configuration
//! store (`settings` namespace) and the durable expiry schedule
//! (`schedule` namespace). Two implementations are provided:
//!
//! - [`MemoryKvStore`] (always available): tests and ephemeral runs
//! - `SurrealKvStore` (feature **`kv`**): embedded, ACID, survives restarts
//!
//! Most callers hold a [`ScopedKvStore`], which pre-binds one namespace and
//! adds typed JSON access.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use kv::{KvStore, MemoryKvStore, ScopedKvStore};

#[cfg(feature = "kv")]
pub use kv::SurrealKvStore;
