#![forbid(unsafe_code)]

//! Process-wide layout store for hosts that want one shared instance.

use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::store::LayoutStore;

static STORE: OnceLock<Mutex<LayoutStore>> = OnceLock::new();

/// Install the shared store. Only the first call wins; later calls are rejected and
/// their store is dropped.
pub fn init(store: LayoutStore) -> bool {
	let panels = store.panels().len();
	match STORE.set(Mutex::new(store)) {
		Ok(()) => {
			info!(panels, "shared layout store installed");
			true
		}
		Err(_) => {
			warn!("shared layout store already installed; ignoring second init");
			false
		}
	}
}

pub fn is_initialized() -> bool {
	STORE.get().is_some()
}

/// Run `f` against the shared store. `None` before `init`.
pub fn with_store<R>(f: impl FnOnce(&mut LayoutStore) -> R) -> Option<R> {
	let lock = STORE.get()?;
	let mut store = lock.lock();
	Some(f(&mut store))
}

/// Write any pending layout now. False when nothing is installed or the write failed.
pub fn flush() -> bool {
	with_store(LayoutStore::flush).unwrap_or(false)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use pinpane_domain::{PanelDraft, PanelKind, TargetId};

	use super::*;
	use crate::scheduler::ManualClock;
	use crate::storage::MemoryStorage;
	use crate::store::StoreOptions;

	// Single test: the store is process-wide.
	#[test]
	fn install_once_then_share() {
		let storage = MemoryStorage::new();
		assert!(with_store(|s| s.revision()).is_none());
		assert!(!flush());

		let store = LayoutStore::open(
			StoreOptions::default(),
			Arc::new(storage.clone()),
			Arc::new(ManualClock::new()),
		);
		assert!(init(store));
		assert!(is_initialized());

		let other = LayoutStore::open(
			StoreOptions::default(),
			Arc::new(MemoryStorage::new()),
			Arc::new(ManualClock::new()),
		);
		assert!(!init(other));

		let pinned = with_store(|s| {
			s.pin(PanelDraft::new(PanelKind::Dm, TargetId::new("u1").unwrap(), "u1"))
				.changed()
		});
		assert_eq!(pinned, Some(true));
		assert_eq!(storage.write_count(), 0);

		assert!(flush());
		assert_eq!(storage.write_count(), 1);
		assert_eq!(with_store(|s| s.panels().len()), Some(1));
	}
}
