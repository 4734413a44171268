//! Calibration persistence behind a key-value store

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use log::{info, warn};
use thiserror_no_std::Error;

use super::CalibrationResult;

/// Storage key for the saved calibration
pub const CALIBRATION_KEY: &str = "aimsense:calibration:v1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to encode calibration")]
    Encode,
    #[error("Storage backend error: {details}")]
    Backend { details: heapless::String<64> },
}

impl StoreError {
    /// Build a backend error, truncating `details` to fit
    pub fn backend(details: &str) -> Self {
        let mut s = heapless::String::new();
        for c in details.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        Self::Backend { details: s }
    }
}

/// Durable byte storage provided by the platform (app storage, flash, files).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Non-persistent [`KeyValueStore`], used for tests and as a fallback.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(String::from(key), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Loads and saves the single [`CalibrationResult`] under [`CALIBRATION_KEY`].
pub struct CalibrationRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CalibrationRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Load the saved calibration.
    ///
    /// Bytes that no longer decode are treated as "no calibration" so the
    /// user is simply asked to calibrate again.
    pub fn load(&self) -> Result<Option<CalibrationResult>, StoreError> {
        let Some(bytes) = self.store.get(CALIBRATION_KEY)? else {
            return Ok(None);
        };

        match postcard::from_bytes::<CalibrationResult>(&bytes) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                warn!("Ignoring undecodable calibration ({} bytes): {:?}", bytes.len(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&mut self, result: &CalibrationResult) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(result).map_err(|_| StoreError::Encode)?;
        self.store.set(CALIBRATION_KEY, &bytes)?;
        info!(
            "Saved calibration: {} at {}",
            result.mount_orientation, result.calibrated_at_iso
        );
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(CALIBRATION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::MountOrientation;

    fn result() -> CalibrationResult {
        CalibrationResult {
            mount_orientation: MountOrientation::LandscapeLeft,
            level_zero_roll_deg: Some(-1),
            calibrated_at_iso: String::from("2026-10-14T09:30:00.000Z"),
        }
    }

    #[test]
    fn test_load_missing_is_none() {
        let repo = CalibrationRepository::new(MemoryStore::new());
        assert_eq!(repo.load(), Ok(None));
    }

    #[test]
    fn test_save_then_load() {
        let mut repo = CalibrationRepository::new(MemoryStore::new());
        repo.save(&result()).unwrap();
        assert_eq!(repo.load(), Ok(Some(result())));

        repo.clear().unwrap();
        assert_eq!(repo.load(), Ok(None));
    }

    #[test]
    fn test_corrupt_bytes_load_as_none() {
        let mut store = MemoryStore::new();
        store.set(CALIBRATION_KEY, &[0xff, 0xff, 0xff]).unwrap();
        let repo = CalibrationRepository::new(store);
        assert_eq!(repo.load(), Ok(None));
    }

    #[test]
    fn test_backend_error_details_are_truncated() {
        let long = "x".repeat(100);
        let StoreError::Backend { details } = StoreError::backend(&long) else {
            panic!("expected backend error");
        };
        assert_eq!(details.len(), 64);
    }
}
