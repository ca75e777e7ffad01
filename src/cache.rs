use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::types::Dataset;

/// Normalized-dataset cache keyed by the content digest of the source file.
///
/// An explicit, passed-around object rather than process-global state:
/// whoever owns the cache decides when entries appear and disappear.
/// Identical bytes re-uploaded hit the cache; changed content is simply a
/// new key.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<String, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> DatasetCache {
        DatasetCache::default()
    }

    /// SHA-256 hex digest of the raw file bytes; the cache key.
    pub fn digest(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    pub fn get(&self, key: &str) -> Option<Arc<Dataset>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.entries.insert(key, Arc::clone(&dataset));
        dataset
    }

    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
