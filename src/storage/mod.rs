//! Local persistence
//!
//! An opaque key-value store (`store`) and the typed mirror that keeps the
//! session and document collection in sync with it (`mirror`).

mod mirror;
mod store;

pub use mirror::{PersistenceMirror, DOCUMENTS_KEY, TOKEN_KEY, USER_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};

use crate::settings::{StorageBackend, StorageSettings};
use std::sync::Arc;

/// Build the store selected in settings
///
/// # Errors
///
/// Returns an error if the file store directory cannot be created
pub fn open_store(settings: &StorageSettings) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match settings.backend {
        StorageBackend::Memory => {
            log::info!("💾 Using in-memory storage (nothing survives restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::File => {
            let store = FileStore::open(&settings.path)?;
            log::info!("💾 Using file storage at {}", store.root().display());
            Ok(Arc::new(store))
        }
    }
}
