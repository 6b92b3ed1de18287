#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{ConfigOverrides, SplitViewConfig};
use crate::keybinds::Keybinds;
use crate::persistence::DEFAULT_STORAGE_KEY;
use crate::responsive::{DEFAULT_BREAKPOINT, DEFAULT_SETTLE, ResponsiveCoordinator};
use crate::storage::{FileStorage, default_storage_dir};
use crate::store::{DEFAULT_PERSIST_DEBOUNCE, DEFAULT_PERSIST_MAX_DELAY, StoreOptions};

pub fn settings_dir() -> PathBuf {
	if let Some(cfg) = dirs::config_dir() {
		return cfg.join("pinpane");
	}

	if let Some(home) = dirs::home_dir() {
		return home.join(".config").join("pinpane");
	}

	PathBuf::from(".").join("pinpane")
}

pub fn default_settings_path() -> PathBuf {
	settings_dir().join("layout.toml")
}

/// Load settings from the default path and env overrides.
pub fn load_settings() -> anyhow::Result<LayoutSettings> {
	load_settings_from_path(&default_settings_path())
}

/// Same as `load_settings` but with an explicit path. A missing file yields defaults.
pub fn load_settings_from_path(path: &Path) -> anyhow::Result<LayoutSettings> {
	let file_cfg = read_toml_if_exists(path)
		.with_context(|| format!("read layout settings from {}", path.display()))?
		.unwrap_or_default();

	let mut settings = LayoutSettings::from_file(file_cfg);
	apply_env_overrides(&mut settings, |k| std::env::var(k).ok());
	settings.split_view = settings.split_view.sanitized();

	Ok(settings)
}

/// Engine settings.
///
/// `split_view` is the config for a first start. Once a layout has been stored its config
/// is restored instead, except for the fields in `overrides`: those were set explicitly in
/// the settings file or the environment and are applied on every open.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
	pub split_view: SplitViewConfig,
	pub overrides: ConfigOverrides,
	/// Container width below which panels are hidden.
	pub breakpoint: f32,
	pub settle: Duration,
	pub persist_debounce: Duration,
	pub persist_max_delay: Duration,
	pub storage_key: String,
	/// Directory for `FileStorage`; platform data dir when unset.
	pub storage_dir: Option<PathBuf>,
	pub keybinds: Keybinds,
}

impl Default for LayoutSettings {
	fn default() -> Self {
		Self {
			split_view: SplitViewConfig::default(),
			overrides: ConfigOverrides::default(),
			breakpoint: DEFAULT_BREAKPOINT,
			settle: DEFAULT_SETTLE,
			persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
			persist_max_delay: DEFAULT_PERSIST_MAX_DELAY,
			storage_key: DEFAULT_STORAGE_KEY.to_string(),
			storage_dir: None,
			keybinds: Keybinds::default(),
		}
	}
}

impl LayoutSettings {
	pub fn store_options(&self) -> StoreOptions {
		StoreOptions {
			storage_key: self.storage_key.clone(),
			defaults: self.split_view.clone(),
			overrides: self.overrides.clone(),
			persist_debounce: self.persist_debounce,
			persist_max_delay: self.persist_max_delay,
		}
	}

	pub fn coordinator(&self) -> ResponsiveCoordinator {
		ResponsiveCoordinator::new(self.breakpoint, self.settle)
	}

	pub fn file_storage(&self) -> FileStorage {
		FileStorage::new(self.storage_dir.clone().unwrap_or_else(default_storage_dir))
	}

	fn from_file(file: FileConfig) -> Self {
		let d = Self::default();
		let split_view = file.split_view.apply(&d.split_view);

		let breakpoint = file
			.viewport
			.breakpoint
			.filter(|b| b.is_finite() && *b >= 0.0)
			.unwrap_or(d.breakpoint);

		Self {
			split_view,
			overrides: file.split_view,
			breakpoint,
			settle: file.viewport.settle_ms.map(Duration::from_millis).unwrap_or(d.settle),
			persist_debounce: file
				.persistence
				.debounce_ms
				.map(Duration::from_millis)
				.unwrap_or(d.persist_debounce),
			persist_max_delay: file
				.persistence
				.max_delay_ms
				.map(Duration::from_millis)
				.unwrap_or(d.persist_max_delay),
			storage_key: file
				.persistence
				.storage_key
				.filter(|s| !s.trim().is_empty())
				.unwrap_or(d.storage_key),
			storage_dir: file
				.persistence
				.storage_dir
				.filter(|s| !s.trim().is_empty())
				.map(PathBuf::from),
			keybinds: file.keybinds,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
	#[serde(default)]
	split_view: ConfigOverrides,
	#[serde(default)]
	viewport: FileViewport,
	#[serde(default)]
	persistence: FilePersistence,
	#[serde(default)]
	keybinds: Keybinds,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileViewport {
	breakpoint: Option<f32>,
	settle_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FilePersistence {
	storage_key: Option<String>,
	storage_dir: Option<String>,
	debounce_ms: Option<u64>,
	max_delay_ms: Option<u64>,
}

fn parse_env_bool(v: &str) -> Option<bool> {
	match v.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

fn read_toml_if_exists(path: &Path) -> anyhow::Result<Option<FileConfig>> {
	match fs::read_to_string(path) {
		Ok(s) => {
			let cfg: FileConfig = toml::from_str(&s).context("parse TOML")?;
			Ok(Some(cfg))
		}
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
		Err(e) => Err(anyhow!(e).context("read settings file")),
	}
}

fn apply_env_overrides(cfg: &mut LayoutSettings, env: impl Fn(&str) -> Option<String>) {
	if let Some(v) = env("PINPANE_BREAKPOINT")
		&& let Ok(bp) = v.trim().parse::<f32>()
	{
		if bp.is_finite() && bp >= 0.0 {
			cfg.breakpoint = bp;
			info!(breakpoint = bp, "layout settings: breakpoint overridden by env");
		} else {
			warn!(value = %v, "layout settings: PINPANE_BREAKPOINT unusable; ignoring");
		}
	}

	if let Some(v) = env("PINPANE_MAX_PANELS")
		&& let Ok(max) = v.trim().parse::<usize>()
	{
		cfg.split_view.max_panels = max;
		cfg.overrides.max_panels = Some(max);
		info!(max, "layout settings: max_panels overridden by env");
	}

	if let Some(v) = env("PINPANE_ENABLED")
		&& let Some(enabled) = parse_env_bool(&v)
	{
		cfg.split_view.enabled = enabled;
		cfg.overrides.enabled = Some(enabled);
		info!(enabled, "layout settings: enabled overridden by env");
	}

	if let Some(v) = env("PINPANE_STORAGE_DIR") {
		let v = v.trim().to_string();
		if !v.is_empty() {
			cfg.storage_dir = Some(PathBuf::from(v));
			info!("layout settings: storage_dir overridden by env");
		}
	}

	if let Some(v) = env("PINPANE_PERSIST_DEBOUNCE_MS")
		&& let Ok(ms) = v.trim().parse::<u64>()
	{
		cfg.persist_debounce = Duration::from_millis(ms);
		info!(ms, "layout settings: persist_debounce overridden by env");
	}

	if cfg.persist_max_delay < cfg.persist_debounce {
		warn!(
			debounce_ms = cfg.persist_debounce.as_millis(),
			max_delay_ms = cfg.persist_max_delay.as_millis(),
			"layout settings: persist max delay below debounce; raising it"
		);
		cfg.persist_max_delay = cfg.persist_debounce;
	}
}
