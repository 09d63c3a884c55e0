//! Local persistence with soft failure
//!
//! Features:
//! - `KeyValueStore` seam over LocalStorage (browser) or a map (native/tests)
//! - Versioned JSON envelope, with legacy bare values still accepted
//! - Typed errors; loads fall back to defaults and log instead of failing

pub mod envelope;
pub mod store;

pub use envelope::{FORMAT_VERSION, decode, encode};
#[cfg(target_arch = "wasm32")]
pub use store::LocalStore;
pub use store::{KeyValueStore, MemoryStore};

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Why a persisted value could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// Nothing stored under the key
    Missing { key: String },
    /// Stored text is not JSON of the expected shape
    Malformed { key: String, reason: String },
    /// Envelope written by a newer (or unknown) format
    UnsupportedVersion { key: String, version: u64 },
    /// Well-formed but semantically unusable (bad indices, empty ghost...)
    Invalid { key: String, reason: String },
    /// The backing store refused the operation
    Unavailable { reason: String },
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Missing { key } => write!(f, "no value stored under '{}'", key),
            PersistError::Malformed { key, reason } => {
                write!(f, "value under '{}' is malformed: {}", key, reason)
            }
            PersistError::UnsupportedVersion { key, version } => write!(
                f,
                "value under '{}' has unsupported format version {} (expected {})",
                key, version, FORMAT_VERSION
            ),
            PersistError::Invalid { key, reason } => {
                write!(f, "value under '{}' is invalid: {}", key, reason)
            }
            PersistError::Unavailable { reason } => write!(f, "storage unavailable: {}", reason),
        }
    }
}

impl std::error::Error for PersistError {}

/// Read and decode the value under `key`
pub fn load<T, S>(store: &S, key: &str) -> Result<T, PersistError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key)?.ok_or_else(|| PersistError::Missing {
        key: key.to_string(),
    })?;
    decode(key, &raw)
}

/// Encode and write `value` under `key`
pub fn save<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), PersistError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = encode(key, value)?;
    store.set(key, &raw)
}

/// Load, falling back to `T::default()` on any error
pub fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    recover(load(store, key)).unwrap_or_default()
}

/// Turn a load result into an option, logging why it was dropped
pub fn recover<T>(result: Result<T, PersistError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err @ PersistError::Missing { .. }) => {
            log::debug!("{err}, using defaults");
            None
        }
        Err(err) => {
            log::warn!("{err}, using defaults");
            None
        }
    }
}

/// Save, logging (and otherwise ignoring) failures
pub fn save_logged<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    if let Err(err) = save(store, key, value) {
        log::warn!("Failed to persist '{key}': {err}");
    }
}
