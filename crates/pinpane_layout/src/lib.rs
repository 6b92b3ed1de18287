#![forbid(unsafe_code)]

//! Split-view layout engine: pinned side panels next to a main region, with resize
//! gestures, responsive gating and debounced persistence behind host-provided ports.

pub mod config;
pub mod controller;
pub mod global;
pub mod input;
pub mod keybinds;
pub mod persistence;
pub mod responsive;
pub mod scheduler;
pub mod settings;
pub mod storage;
pub mod store;
pub mod view;

pub use config::{ConfigOverrides, EvictionPolicy, SplitViewConfig};
pub use controller::{Handled, ResizeGestureController};
pub use input::{InputEvent, InputPort, Key, Modifiers, QueuedInput};
pub use keybinds::{Keybinds, ResolvedKeybinds, Shortcut};
pub use persistence::{LayoutPersistence, PersistedLayout, PersistenceError};
pub use responsive::{ResponsiveCoordinator, ViewportEvent, ViewportPort};
pub use scheduler::{Clock, ManualClock, SharedClock, SystemClock};
pub use settings::{LayoutSettings, load_settings, load_settings_from_path};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, SharedStorage, StorageError};
pub use store::{
	LayoutChange, LayoutNotice, LayoutSnapshot, LayoutStore, NoticeKind, PinOutcome, PinToggle, ResizeGesture,
	StoreOptions, SubscriptionId,
};
pub use view::{LayoutView, PaneSlot, compose};

pub use pinpane_domain as domain;
