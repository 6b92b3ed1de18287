#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("storage is unavailable")]
	Unavailable,
	#[error("storage quota exceeded (needed {needed} bytes, limit {limit})")]
	QuotaExceeded { needed: usize, limit: usize },
	#[error("storage io: {0}")]
	Io(#[from] io::Error),
}

/// Durable key/value storage the layout is written to.
pub trait KeyValueStorage: Send + Sync {
	fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
	fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
	fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub type SharedStorage = Arc<dyn KeyValueStorage>;

#[derive(Debug, Default)]
struct MemoryInner {
	entries: HashMap<String, String>,
	quota: Option<usize>,
	disabled: bool,
	writes: usize,
}

/// In-memory storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
	inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	/// Rejects writes whose total size would exceed `bytes`.
	pub fn with_quota(bytes: usize) -> Self {
		let s = Self::default();
		s.inner.lock().quota = Some(bytes);
		s
	}

	/// Every call fails with `StorageError::Unavailable`.
	pub fn disabled() -> Self {
		let s = Self::default();
		s.inner.lock().disabled = true;
		s
	}

	pub fn set_disabled(&self, disabled: bool) {
		self.inner.lock().disabled = disabled;
	}

	/// Number of successful `set` calls.
	pub fn write_count(&self) -> usize {
		self.inner.lock().writes
	}

	pub fn raw(&self, key: &str) -> Option<String> {
		self.inner.lock().entries.get(key).cloned()
	}
}

impl KeyValueStorage for MemoryStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		let inner = self.inner.lock();
		if inner.disabled {
			return Err(StorageError::Unavailable);
		}
		Ok(inner.entries.get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		let mut inner = self.inner.lock();
		if inner.disabled {
			return Err(StorageError::Unavailable);
		}
		if let Some(limit) = inner.quota {
			let others: usize = inner
				.entries
				.iter()
				.filter(|(k, _)| k.as_str() != key)
				.map(|(k, v)| k.len() + v.len())
				.sum();
			let needed = others + key.len() + value.len();
			if needed > limit {
				return Err(StorageError::QuotaExceeded { needed, limit });
			}
		}
		inner.entries.insert(key.to_string(), value.to_string());
		inner.writes += 1;
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StorageError> {
		let mut inner = self.inner.lock();
		if inner.disabled {
			return Err(StorageError::Unavailable);
		}
		inner.entries.remove(key);
		Ok(())
	}
}

pub fn default_storage_dir() -> PathBuf {
	if let Some(data) = dirs::data_dir() {
		return data.join("pinpane");
	}

	if let Some(home) = dirs::home_dir() {
		return home.join(".pinpane");
	}

	PathBuf::from(".").join("pinpane")
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
	dir: PathBuf,
}

impl FileStorage {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn path_for(&self, key: &str) -> PathBuf {
		let name: String = key
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
			.collect();
		self.dir.join(format!("{name}.json"))
	}
}

impl Default for FileStorage {
	fn default() -> Self {
		Self::new(default_storage_dir())
	}
}

impl KeyValueStorage for FileStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		let path = self.path_for(key);
		match fs::read_to_string(&path) {
			Ok(s) => Ok(Some(s)),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				debug!("no stored value at {}", path.display());
				Ok(None)
			}
			Err(e) => Err(e.into()),
		}
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		fs::create_dir_all(&self.dir)?;
		let path = self.path_for(key);
		let tmp = path.with_extension("json.tmp");
		fs::write(&tmp, value)?;
		fs::rename(&tmp, &path)?;
		info!("wrote {} ({} bytes)", path.display(), value.len());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.path_for(key)) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}
