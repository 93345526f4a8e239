//! Save/load persistence
//!
//! Features:
//! - `KeyValueStore` seam: LocalStorage on the web, in-memory elsewhere
//! - Versioned JSON envelope around every stored value
//! - Typed `StorageError` for the one fallible boundary in the crate

pub mod store;

pub use store::{
    ENVELOPE_VERSION, Envelope, KeyValueStore, MemoryStore, StorageError, load_json, save_json,
};

#[cfg(target_arch = "wasm32")]
pub use store::LocalStore;

/// Storage for the current platform
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn KeyValueStore> {
    match LocalStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("LocalStorage unavailable ({}), scores will not persist", e);
            Box::new(MemoryStore::default())
        }
    }
}

/// Storage for the current platform
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Box<dyn KeyValueStore> {
    Box::new(MemoryStore::default())
}
