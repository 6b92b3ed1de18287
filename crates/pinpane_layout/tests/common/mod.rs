#![forbid(unsafe_code)]
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use pinpane_layout::domain::{PanelDraft, PanelKind, ServerId, TargetId};
use pinpane_layout::{LayoutStore, ManualClock, MemoryStorage, SplitViewConfig, StoreOptions};

static LOG_INIT: OnceLock<()> = OnceLock::new();

pub fn init_test_logging() {
	LOG_INIT.get_or_init(|| {
		if std::env::var_os("PINPANE_TEST_LOG").is_none() {
			return;
		}

		let _ = tracing_subscriber::fmt()
			.with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
			.with_target(false)
			.with_test_writer()
			.try_init();
	});
}

pub fn draft(kind: PanelKind, id: &str) -> PanelDraft {
	let d = PanelDraft::new(kind, TargetId::new(id).expect("target id"), format!("#{id}"));
	if kind.requires_server() {
		d.with_server(ServerId::new("srv-1").expect("server id"))
	} else {
		d
	}
}

pub fn channel(id: &str) -> PanelDraft {
	draft(PanelKind::Channel, id)
}

pub struct Harness {
	pub store: LayoutStore,
	pub storage: MemoryStorage,
	pub clock: ManualClock,
}

impl Harness {
	pub fn new(config: SplitViewConfig) -> Self {
		Self::with_storage(config, MemoryStorage::new())
	}

	pub fn with_storage(config: SplitViewConfig, storage: MemoryStorage) -> Self {
		init_test_logging();
		let clock = ManualClock::new();
		let options = StoreOptions {
			defaults: config,
			..StoreOptions::default()
		};
		let store = LayoutStore::open(options, Arc::new(storage.clone()), Arc::new(clock.clone()));
		Self { store, storage, clock }
	}

	/// A second store over the same storage, as after a page reload.
	pub fn reopen(&self) -> LayoutStore {
		LayoutStore::open(
			StoreOptions::default(),
			Arc::new(self.storage.clone()),
			Arc::new(self.clock.clone()),
		)
	}
}
