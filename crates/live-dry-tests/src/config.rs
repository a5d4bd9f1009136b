// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use live_hydrate::{ConfigError, ConfigStore};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Key the fixtures store the hydration config under.
pub const HYDRATION_CONFIG_KEY: &str = "live_hydration";

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Tracks call counts and can be told to fail, so tests can check how the
/// hydrator reacts to a broken config backend.
///
/// # Example
///
/// ```
/// use live_dry_tests::InMemoryConfigStore;
/// use live_hydrate::{DefaultNormalizer, LiveHydrator, NoEntities};
///
/// let store = InMemoryConfigStore::with_hydration_config("s3cret");
/// let hydrator = LiveHydrator::from_config_store(
///     DefaultNormalizer::new(NoEntities),
///     store.clone(),
///     live_dry_tests::config::HYDRATION_CONFIG_KEY,
/// );
/// assert!(hydrator.is_ok());
/// assert_eq!(store.load_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<InMemoryConfigStoreInner>>,
}

#[derive(Default)]
struct InMemoryConfigStoreInner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a [`HydrationConfig`] with `secret` under
    /// [`HYDRATION_CONFIG_KEY`]. The seed is not counted as a save.
    pub fn with_hydration_config(secret: &str) -> Self {
        let store = Self::new();
        let blob = json!({ "checksumSecret": secret }).to_string();
        store.seed_raw(HYDRATION_CONFIG_KEY, blob.as_bytes());
        store
    }

    /// Store a raw blob without counting it as a save.
    pub fn seed_raw(&self, key: &str, data: &[u8]) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .insert(key.to_owned(), data.to_vec());
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fail_on_load = fail;
    }

    /// Number of `load_raw` attempts, including failed ones.
    pub fn load_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .load_count
    }

    /// Number of `save_raw` attempts.
    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save_count
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_count += 1;
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
