//! Opening the configured key-value backend.

use std::path::PathBuf;
use std::sync::Arc;

use mindful_config::{StorageBackend, StorageSection};
use mindful_storage::{KvStore, MemoryKvStore, StorageError, SurrealKvStore};

/// An open store, plus what is needed to close it cleanly.
pub struct OpenStore {
    store: Arc<dyn KvStore>,
    persistent: Option<Arc<SurrealKvStore>>,
}

impl OpenStore {
    /// Open the backend named by `section`.
    ///
    /// `default_dir` is used when the section names no data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// database cannot be opened.
    pub fn open(section: &StorageSection, default_dir: PathBuf) -> Result<Self, StorageError> {
        match section.backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory store; nothing survives a restart");
                Ok(Self {
                    store: Arc::new(MemoryKvStore::new()),
                    persistent: None,
                })
            },
            StorageBackend::Surrealkv => {
                let dir = section.data_dir.clone().unwrap_or(default_dir);
                std::fs::create_dir_all(&dir).map_err(|e| {
                    StorageError::Connection(format!("cannot create {}: {e}", dir.display()))
                })?;
                let kv = Arc::new(SurrealKvStore::open(&dir)?);
                tracing::info!(path = %dir.display(), "Opened persistent store");
                Ok(Self {
                    store: kv.clone(),
                    persistent: Some(kv),
                })
            },
        }
    }

    /// The store, shared by settings and schedule.
    #[must_use]
    pub fn store(&self) -> Arc<dyn KvStore> {
        Arc::clone(&self.store)
    }

    /// Flush and close a persistent backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub async fn close(self) -> Result<(), StorageError> {
        if let Some(kv) = self.persistent {
            kv.close().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for OpenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStore")
            .field("persistent", &self.persistent.is_some())
            .finish_non_exhaustive()
    }
}
