//! Thread-safe in-memory [`KeyValueStore`] implementation for local development and tests.

// self
use crate::{_prelude::*, store::KeyValueStore};

/// Storage backend that keeps values in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<String, String>>>);
impl MemoryStore {
	/// Returns the number of stored keys.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) {
		self.0.write().insert(key.to_owned(), value.to_owned());
	}

	fn remove(&self, key: &str) {
		self.0.write().remove(key);
	}
}
