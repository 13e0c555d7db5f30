//! LocalStorage persistence helpers
//!
//! The simulation never touches storage; the host saves settings and the
//! courier profile through these helpers. Native builds have no storage and
//! treat every key as missing.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("local storage is unavailable")]
    Unavailable,
    #[error("storage rejected write for key `{0}`")]
    Write(String),
}

/// Serialize a value for storage
pub fn encode<T: Serialize>(value: &T) -> Result<String, PersistError> {
    Ok(serde_json::to_string(value)?)
}

/// Parse a stored value; corrupt data is logged and treated as missing
pub fn decode<T: DeserializeOwned>(key: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Discarding corrupt `{}` entry: {}", key, err);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn storage() -> Option<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}

/// Load a value from LocalStorage
#[cfg(target_arch = "wasm32")]
pub fn load<T: DeserializeOwned>(key: &str) -> Option<T> {
    let json = storage()?.get_item(key).ok()??;
    decode(key, &json)
}

/// Save a value to LocalStorage
#[cfg(target_arch = "wasm32")]
pub fn save<T: Serialize>(key: &str, value: &T) -> Result<(), PersistError> {
    let json = encode(value)?;
    let storage = storage().ok_or(PersistError::Unavailable)?;
    storage
        .set_item(key, &json)
        .map_err(|_| PersistError::Write(key.to_string()))
}

#[cfg(target_arch = "wasm32")]
pub fn remove(key: &str) {
    if let Some(storage) = storage() {
        let _ = storage.remove_item(key);
    }
}

/// Native stubs
#[cfg(not(target_arch = "wasm32"))]
pub fn load<T: DeserializeOwned>(_key: &str) -> Option<T> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save<T: Serialize>(_key: &str, value: &T) -> Result<(), PersistError> {
    // Still encode so serialization bugs show up natively
    encode(value).map(|_| ())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn remove(_key: &str) {}
