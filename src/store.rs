//! Key-value storage contract and built-in backends that persist credential material.
//!
//! The pipeline never talks to a storage engine directly. It consumes a [`KeyValueStore`]
//! capability with `get`/`set`/`remove` semantics and last-write-wins behavior, mirroring
//! the browser-profile storage the dashboards originally relied on. Backends own their
//! failure handling; the contract itself is infallible.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Persistent string key-value capability injected into the credential store.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if any.
	fn get(&self, key: &str) -> Option<String>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: &str, value: &str);

	/// Removes `key`; removing a missing key is a no-op.
	fn remove(&self, key: &str);
}

/// Error type produced while opening a [`KeyValueStore`] backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
