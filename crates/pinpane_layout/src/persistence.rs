#![forbid(unsafe_code)]

use std::collections::HashSet;

use pinpane_domain::{PanelEntry, PanelId, PanelKind, ServerId, TargetId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SplitViewConfig;
use crate::storage::{KeyValueStorage, StorageError};

pub const DEFAULT_STORAGE_KEY: &str = "pinpane.split-view";

/// Version 1 kept the list under `pinned` and each width under `size`.
pub const CURRENT_LAYOUT_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum PersistenceError {
	#[error("storage: {0}")]
	Storage(#[from] StorageError),
	#[error("serialize layout: {0}")]
	Serialize(#[from] serde_json::Error),
}

/// The record kept in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLayout {
	pub version: u32,
	pub config: SplitViewConfig,
	pub panels: Vec<PanelEntry>,
}

impl PersistedLayout {
	pub fn new(config: SplitViewConfig, panels: Vec<PanelEntry>) -> Self {
		Self {
			version: CURRENT_LAYOUT_VERSION,
			config,
			panels,
		}
	}

	pub fn empty(config: SplitViewConfig) -> Self {
		Self::new(config, Vec::new())
	}
}

#[derive(Serialize)]
struct PersistedLayoutRef<'a> {
	version: u32,
	config: &'a SplitViewConfig,
	panels: &'a [PanelEntry],
}

/// Reads and writes the layout record under one storage key.
#[derive(Debug, Clone)]
pub struct LayoutPersistence {
	key: String,
	defaults: SplitViewConfig,
}

impl LayoutPersistence {
	/// `defaults` fills config fields missing from the stored record, and is the whole
	/// config when nothing usable is stored.
	pub fn new(key: impl Into<String>, defaults: SplitViewConfig) -> Self {
		Self {
			key: key.into(),
			defaults: defaults.sanitized(),
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn save(
		&self,
		storage: &dyn KeyValueStorage,
		config: &SplitViewConfig,
		panels: &[PanelEntry],
	) -> Result<(), PersistenceError> {
		let record = PersistedLayoutRef {
			version: CURRENT_LAYOUT_VERSION,
			config,
			panels,
		};
		let data = serde_json::to_string(&record)?;
		storage.set(&self.key, &data)?;
		Ok(())
	}

	/// Never fails: unreadable, corrupt or unknown records yield the default layout.
	pub fn load(&self, storage: &dyn KeyValueStorage) -> PersistedLayout {
		let raw = match storage.get(&self.key) {
			Ok(Some(raw)) => raw,
			Ok(None) => {
				info!(key = %self.key, "no stored layout; starting empty");
				return PersistedLayout::empty(self.defaults.clone());
			}
			Err(e) => {
				warn!(key = %self.key, error = %e, "failed to read stored layout; starting empty");
				return PersistedLayout::empty(self.defaults.clone());
			}
		};

		let layout = self.decode(&raw);
		info!(key = %self.key, panels = layout.panels.len(), "loaded stored layout");
		layout
	}

	pub fn clear(&self, storage: &dyn KeyValueStorage) -> Result<(), PersistenceError> {
		storage.remove(&self.key)?;
		Ok(())
	}

	pub fn decode(&self, raw: &str) -> PersistedLayout {
		let value = match serde_json::from_str::<Value>(raw) {
			Ok(v) => v,
			Err(e) => {
				warn!(error = %e, "stored layout is not valid JSON; using defaults");
				return PersistedLayout::empty(self.defaults.clone());
			}
		};

		let Some(value) = migrate_layout_json(value) else {
			return PersistedLayout::empty(self.defaults.clone());
		};

		let Some(obj) = value.as_object() else {
			warn!("stored layout is not an object; using defaults");
			return PersistedLayout::empty(self.defaults.clone());
		};

		let config = match obj.get("config").and_then(Value::as_object) {
			Some(cfg) => decode_config(cfg, &self.defaults),
			None => self.defaults.clone(),
		};

		let panels = match obj.get("panels").and_then(Value::as_array) {
			Some(items) => decode_panels(items, &config),
			None => Vec::new(),
		};

		PersistedLayout::new(config, panels)
	}
}

fn stored_version(v: &Value) -> Option<u32> {
	match v.get("version") {
		None | Some(Value::Null) => Some(0),
		Some(x) => x.as_u64().and_then(|n| u32::try_from(n).ok()),
	}
}

/// Upgrade a stored record to `CURRENT_LAYOUT_VERSION`. `None` when the version is not one
/// this build can read.
pub fn migrate_layout_json(mut v: Value) -> Option<Value> {
	let Some(mut version) = stored_version(&v) else {
		warn!("stored layout has an unreadable version tag; using defaults");
		return None;
	};

	if version > CURRENT_LAYOUT_VERSION {
		warn!(version, current = CURRENT_LAYOUT_VERSION, "stored layout is from a newer version; using defaults");
		return None;
	}

	let table = v.as_object_mut()?;

	// Unversioned records share the version 1 shape.
	if version == 0 {
		version = 1;
	}

	if version == 1 {
		if let Some(pinned) = table.remove("pinned")
			&& !table.contains_key("panels")
		{
			table.insert("panels".to_string(), pinned);
		}
		if let Some(Value::Array(panels)) = table.get_mut("panels") {
			for panel in panels.iter_mut().filter_map(Value::as_object_mut) {
				if let Some(size) = panel.remove("size")
					&& !panel.contains_key("width")
				{
					panel.insert("width".to_string(), size);
				}
			}
		}
		version = 2;
		info!("migrated stored layout from version 1");
	}

	table.insert("version".to_string(), Value::from(version));
	Some(v)
}

fn take_field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str, slot: &mut T) {
	let Some(raw) = obj.get(key) else {
		return;
	};
	match serde_json::from_value::<T>(raw.clone()) {
		Ok(v) => *slot = v,
		Err(e) => warn!(field = key, error = %e, "stored layout config field malformed; using default"),
	}
}

fn decode_config(obj: &Map<String, Value>, defaults: &SplitViewConfig) -> SplitViewConfig {
	let mut cfg = defaults.clone();
	take_field(obj, "mainPanelMinWidth", &mut cfg.main_panel_min_width);
	take_field(obj, "paneMinWidth", &mut cfg.pane_min_width);
	take_field(obj, "paneMaxWidth", &mut cfg.pane_max_width);
	take_field(obj, "maxPanels", &mut cfg.max_panels);
	take_field(obj, "enabled", &mut cfg.enabled);
	take_field(obj, "defaultPaneWidth", &mut cfg.default_pane_width);
	take_field(obj, "collapsedWidth", &mut cfg.collapsed_width);
	take_field(obj, "eviction", &mut cfg.eviction);
	cfg.sanitized()
}

fn decode_panel(v: &Value, cfg: &SplitViewConfig) -> Option<PanelEntry> {
	let obj = v.as_object()?;
	let kind: PanelKind = obj
		.get("type")
		.and_then(Value::as_str)
		.and_then(|s| s.parse().ok())?;
	let target_id = obj
		.get("targetId")
		.and_then(Value::as_str)
		.and_then(|s| TargetId::new(s).ok())?;

	let id = obj
		.get("id")
		.and_then(|v| serde_json::from_value::<PanelId>(v.clone()).ok())
		.unwrap_or_else(PanelId::new_v4);
	let server_id = obj
		.get("serverId")
		.and_then(Value::as_str)
		.and_then(|s| ServerId::new(s).ok());
	let title = obj.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
	let icon_url = obj
		.get("iconUrl")
		.and_then(Value::as_str)
		.filter(|s| !s.trim().is_empty())
		.map(str::to_string);
	let width = obj
		.get("width")
		.and_then(Value::as_f64)
		.map(|w| cfg.clamp_pane_width(w as f32))
		.unwrap_or_else(|| cfg.default_width());
	let collapsed = obj.get("collapsed").and_then(Value::as_bool).unwrap_or(false);

	Some(PanelEntry {
		id,
		kind,
		target_id,
		server_id,
		title,
		icon_url,
		width,
		collapsed,
	})
}

fn decode_panels(items: &[Value], cfg: &SplitViewConfig) -> Vec<PanelEntry> {
	let mut seen_targets = HashSet::new();
	let mut seen_ids = HashSet::new();
	let mut panels = Vec::with_capacity(items.len().min(cfg.max_panels));

	for (index, item) in items.iter().enumerate() {
		let Some(mut panel) = decode_panel(item, cfg) else {
			warn!(index, "dropping malformed stored panel");
			continue;
		};
		if !seen_targets.insert(panel.target()) {
			warn!(index, target = %panel.target(), "dropping duplicate stored panel");
			continue;
		}
		if !seen_ids.insert(panel.id) {
			panel.id = PanelId::new_v4();
			seen_ids.insert(panel.id);
		}
		if panels.len() >= cfg.max_panels {
			warn!(index, max = cfg.max_panels, "dropping stored panel beyond max_panels");
			continue;
		}
		panels.push(panel);
	}

	panels
}
