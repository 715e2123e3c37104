//! Knowledge persistence.
//!
//! The model never reaches for ambient storage. It is handed a
//! [`KnowledgeStore`] that reads and writes one text blob: the encoded
//! knowledge base.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Default store location: `~/.holochat/knowledge_base.json`
fn default_store_path() -> Result<PathBuf, StorageError> {
	dirs::home_dir()
		.map(|home| home.join(".holochat").join("knowledge_base.json"))
		.ok_or_else(|| StorageError::Unavailable("no home directory".into()))
}

/// Append `suffix` to the file name of `path`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
	let mut name = path
		.file_name()
		.map(std::ffi::OsStr::to_os_string)
		.unwrap_or_default();
	name.push(suffix);
	path.with_file_name(name)
}

/// Key/value blob persistence for one knowledge base.
pub trait KnowledgeStore {
	/// Read the stored document, or `None` if nothing was ever saved.
	///
	/// # Errors
	///
	/// Returns an error if the backing medium cannot be read.
	fn load(&self) -> Result<Option<String>, StorageError>;

	/// Replace the stored document.
	///
	/// # Errors
	///
	/// Returns an error if the backing medium cannot be written. The
	/// previously stored document must survive a failed save.
	fn save(&mut self, document: &str) -> Result<(), StorageError>;

	/// Keep a copy of a stored document the model refused to load, out of
	/// the way of later saves.
	///
	/// # Errors
	///
	/// Returns an error if the store cannot keep a copy. The default
	/// implementation never can; the model then refuses to save over the
	/// document.
	fn set_aside(&mut self, _document: &str) -> Result<(), StorageError> {
		Err(StorageError::Unavailable(
			"store cannot keep rejected documents".into(),
		))
	}
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store.
///
/// Clones share the same slot, so a clone handed to a second model sees
/// everything the first one saved.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	slot: Arc<Mutex<Option<String>>>,
	rejected: Arc<Mutex<Vec<String>>>,
}

impl MemoryStore {
	/// Create an empty store.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a store that already holds `document`.
	#[must_use]
	pub fn with_document(document: impl Into<String>) -> Self {
		Self {
			slot: Arc::new(Mutex::new(Some(document.into()))),
			rejected: Arc::default(),
		}
	}

	/// Current contents.
	#[must_use]
	pub fn document(&self) -> Option<String> {
		self.slot.lock().clone()
	}

	/// Documents set aside, oldest first.
	#[must_use]
	pub fn rejected(&self) -> Vec<String> {
		self.rejected.lock().clone()
	}
}

impl KnowledgeStore for MemoryStore {
	fn load(&self) -> Result<Option<String>, StorageError> {
		Ok(self.document())
	}

	fn save(&mut self, document: &str) -> Result<(), StorageError> {
		*self.slot.lock() = Some(document.to_owned());
		Ok(())
	}

	fn set_aside(&mut self, document: &str) -> Result<(), StorageError> {
		self.rejected.lock().push(document.to_owned());
		Ok(())
	}
}

// ============================================================================
// File
// ============================================================================

/// Store backed by a single JSON file.
///
/// Saves write a sibling temporary file and rename it over the target, so
/// an interrupted save leaves the previous document in place. Rejected
/// documents are copied to `<name>.rejected` (then `<name>.rejected.1`, ...)
/// next to the target.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
}

impl FileStore {
	/// Store at `path`. Parent directories are created on first save.
	#[must_use]
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Store at the default location under the home directory.
	///
	/// # Errors
	///
	/// Returns [`StorageError::Unavailable`] if there is no home directory.
	pub fn at_default_location() -> Result<Self, StorageError> {
		default_store_path().map(Self::new)
	}

	/// Path of the backing file.
	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn staging_path(&self) -> PathBuf {
		sibling(&self.path, ".tmp")
	}

	/// First `<name>.rejected[.N]` path not already taken.
	fn rejected_path(&self) -> PathBuf {
		let mut candidate = sibling(&self.path, ".rejected");
		let mut n = 1_u32;
		while candidate.exists() {
			candidate = sibling(&self.path, &format!(".rejected.{n}"));
			n += 1;
		}
		candidate
	}

	fn check_file_path(&self) -> Result<(), StorageError> {
		if self.path.file_name().is_none() {
			return Err(StorageError::Unavailable(format!(
				"not a file path: {}",
				self.path.display()
			)));
		}
		Ok(())
	}
}

impl KnowledgeStore for FileStore {
	fn load(&self) -> Result<Option<String>, StorageError> {
		match fs::read_to_string(&self.path) {
			Ok(document) => Ok(Some(document)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	fn save(&mut self, document: &str) -> Result<(), StorageError> {
		self.check_file_path()?;

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}

		let staging = self.staging_path();
		fs::write(&staging, document)?;
		if let Err(e) = fs::rename(&staging, &self.path) {
			let _ = fs::remove_file(&staging);
			return Err(e.into());
		}

		debug!(path = %self.path.display(), bytes = document.len(), "saved knowledge");
		Ok(())
	}

	fn set_aside(&mut self, document: &str) -> Result<(), StorageError> {
		self.check_file_path()?;

		let target = self.rejected_path();
		fs::write(&target, document)?;

		warn!(path = %target.display(), "rejected knowledge document set aside");
		Ok(())
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;

	#[test]
	fn memory_store_clones_share_contents() {
		let mut a = MemoryStore::new();
		let b = a.clone();

		assert_eq!(b.load().unwrap(), None);
		a.save("{}").unwrap();
		assert_eq!(b.load().unwrap().as_deref(), Some("{}"));
	}

	#[test]
	fn file_store_missing_file_is_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().join("absent.json"));
		assert_eq!(store.load().unwrap(), None);
	}

	#[test]
	fn file_store_creates_parents_and_overwrites() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("kb.json");
		let mut store = FileStore::new(&path);

		store.save("first").unwrap();
		store.save("second").unwrap();

		assert_eq!(store.load().unwrap().as_deref(), Some("second"));
		assert!(!dir.path().join("nested").join("kb.json.tmp").exists());
	}

	#[test]
	fn default_path_lives_under_holochat_dir() {
		match FileStore::at_default_location() {
			Ok(store) => assert!(store.path().ends_with(".holochat/knowledge_base.json")),
			Err(e) => assert!(matches!(e, StorageError::Unavailable(_))),
		}
	}

	#[test]
	fn failed_rename_removes_staging_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("kb.json");
		// A non-empty directory at the target makes the rename fail.
		fs::create_dir(&path).unwrap();
		fs::write(path.join("occupied"), "x").unwrap();

		let mut store = FileStore::new(&path);
		assert!(matches!(store.save("{}"), Err(StorageError::Io(_))));
		assert!(!dir.path().join("kb.json.tmp").exists());
	}

	#[test]
	fn file_store_sets_aside_without_overwriting() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("kb.json");
		let mut store = FileStore::new(&path);

		store.set_aside("first").unwrap();
		store.set_aside("second").unwrap();

		let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
		assert_eq!(read("kb.json.rejected"), "first");
		assert_eq!(read("kb.json.rejected.1"), "second");
		assert!(!path.exists());
	}

	#[test]
	fn memory_store_keeps_rejected_documents() {
		let mut store = MemoryStore::with_document("old");
		store.set_aside("old").unwrap();
		assert_eq!(store.rejected(), vec!["old".to_owned()]);
		assert_eq!(store.document().as_deref(), Some("old"));
	}
}
