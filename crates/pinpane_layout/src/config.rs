#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_MAIN_PANEL_MIN_WIDTH: f32 = 400.0;
pub const DEFAULT_PANE_MIN_WIDTH: f32 = 280.0;
pub const DEFAULT_PANE_MAX_WIDTH: f32 = 600.0;
pub const DEFAULT_PANE_WIDTH: f32 = 360.0;
pub const DEFAULT_COLLAPSED_WIDTH: f32 = 48.0;
pub const DEFAULT_MAX_PANELS: usize = 3;

/// What `pin` does once `max_panels` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
	#[default]
	Reject,
	EvictOldest,
}

/// Global split-view configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitViewConfig {
	/// Width reserved for the primary content area.
	pub main_panel_min_width: f32,
	pub pane_min_width: f32,
	pub pane_max_width: f32,
	pub max_panels: usize,
	/// User preference, independent of the viewport.
	pub enabled: bool,
	/// Width given to a freshly pinned pane before clamping.
	pub default_pane_width: f32,
	/// Width of a collapsed pane, regardless of its stored width.
	pub collapsed_width: f32,
	pub eviction: EvictionPolicy,
}

impl Default for SplitViewConfig {
	fn default() -> Self {
		Self {
			main_panel_min_width: DEFAULT_MAIN_PANEL_MIN_WIDTH,
			pane_min_width: DEFAULT_PANE_MIN_WIDTH,
			pane_max_width: DEFAULT_PANE_MAX_WIDTH,
			max_panels: DEFAULT_MAX_PANELS,
			enabled: true,
			default_pane_width: DEFAULT_PANE_WIDTH,
			collapsed_width: DEFAULT_COLLAPSED_WIDTH,
			eviction: EvictionPolicy::Reject,
		}
	}
}

fn usable(v: f32) -> bool {
	v.is_finite() && v >= 0.0
}

impl SplitViewConfig {
	/// Repair a config that came from disk or from a caller.
	pub fn sanitized(mut self) -> Self {
		let d = Self::default();

		if !usable(self.main_panel_min_width) {
			warn!(value = self.main_panel_min_width, "split view: main_panel_min_width unusable; using default");
			self.main_panel_min_width = d.main_panel_min_width;
		}
		if !usable(self.pane_min_width) {
			warn!(value = self.pane_min_width, "split view: pane_min_width unusable; using default");
			self.pane_min_width = d.pane_min_width;
		}
		if !usable(self.pane_max_width) {
			warn!(value = self.pane_max_width, "split view: pane_max_width unusable; using default");
			self.pane_max_width = d.pane_max_width;
		}
		if self.pane_min_width > self.pane_max_width {
			warn!(
				min = self.pane_min_width,
				max = self.pane_max_width,
				"split view: pane_min_width > pane_max_width; swapping"
			);
			core::mem::swap(&mut self.pane_min_width, &mut self.pane_max_width);
		}
		if self.max_panels == 0 {
			warn!("split view: max_panels is 0; raising to 1");
			self.max_panels = 1;
		}
		if !usable(self.default_pane_width) {
			self.default_pane_width = d.default_pane_width;
		}
		if !usable(self.collapsed_width) {
			self.collapsed_width = d.collapsed_width;
		}
		self
	}

	pub fn clamp_pane_width(&self, width: f32) -> f32 {
		if !width.is_finite() {
			return self.default_width();
		}
		width.clamp(self.pane_min_width, self.pane_max_width)
	}

	/// Width assigned on pin.
	pub fn default_width(&self) -> f32 {
		let w = if self.default_pane_width.is_finite() {
			self.default_pane_width
		} else {
			DEFAULT_PANE_WIDTH
		};
		w.clamp(self.pane_min_width, self.pane_max_width)
	}
}

/// Config fields set explicitly by the settings file or the environment.
///
/// The stored layout keeps the user's last config, but these always win over it when a
/// store is opened.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
	pub main_panel_min_width: Option<f32>,
	pub pane_min_width: Option<f32>,
	pub pane_max_width: Option<f32>,
	pub max_panels: Option<usize>,
	pub enabled: Option<bool>,
	pub default_pane_width: Option<f32>,
	pub collapsed_width: Option<f32>,
	pub eviction: Option<EvictionPolicy>,
}

impl ConfigOverrides {
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}

	pub fn apply(&self, base: &SplitViewConfig) -> SplitViewConfig {
		SplitViewConfig {
			main_panel_min_width: self.main_panel_min_width.unwrap_or(base.main_panel_min_width),
			pane_min_width: self.pane_min_width.unwrap_or(base.pane_min_width),
			pane_max_width: self.pane_max_width.unwrap_or(base.pane_max_width),
			max_panels: self.max_panels.unwrap_or(base.max_panels),
			enabled: self.enabled.unwrap_or(base.enabled),
			default_pane_width: self.default_pane_width.unwrap_or(base.default_pane_width),
			collapsed_width: self.collapsed_width.unwrap_or(base.collapsed_width),
			eviction: self.eviction.unwrap_or(base.eviction),
		}
	}
}
