//! Simple file-backed [`KeyValueStore`] for desktop shells, CLIs, and long-lived bots.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	obs,
	store::{KeyValueStore, StoreError},
};

/// Persists values to a JSON file after each mutation.
///
/// Writes go to a sibling `.tmp` file which is synced and renamed over the target, so a
/// crash never leaves a half-written snapshot behind. Persist failures keep the in-memory
/// value, are reported through [`obs`], and remain inspectable via [`FileStore::last_error`].
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<BTreeMap<String, String>>>,
	last_error: Arc<Mutex<Option<StoreError>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)), last_error: Default::default() })
	}

	/// Returns the file path backing this store.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns the most recent persist failure, if the last write did not reach disk.
	pub fn last_error(&self) -> Option<StoreError> {
		self.last_error.lock().clone()
	}

	fn load_snapshot(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
		if !path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &BTreeMap<String, String>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn settle(&self, result: Result<(), StoreError>) {
		let mut slot = self.last_error.lock();

		match result {
			Ok(()) => *slot = None,
			Err(err) => {
				obs::record_store_failure(&err);

				*slot = Some(err);
			},
		}
	}
}
impl KeyValueStore for FileStore {
	fn get(&self, key: &str) -> Option<String> {
		self.inner.read().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) {
		let mut guard = self.inner.write();

		guard.insert(key.to_owned(), value.to_owned());

		let result = self.persist_locked(&guard);

		drop(guard);
		self.settle(result);
	}

	fn remove(&self, key: &str) {
		let mut guard = self.inner.write();

		if guard.remove(key).is_none() {
			return;
		}

		let result = self.persist_locked(&guard);

		drop(guard);
		self.settle(result);
	}
}
