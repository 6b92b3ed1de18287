#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use pinpane_domain::{PanelDraft, PanelEntry, PanelId, PanelKind, PanelTarget, TargetId};
use tracing::{debug, info, warn};

use crate::config::{ConfigOverrides, EvictionPolicy, SplitViewConfig};
use crate::persistence::{DEFAULT_STORAGE_KEY, LayoutPersistence};
use crate::scheduler::{SharedClock, WriteScheduler};
use crate::storage::SharedStorage;

pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(250);
pub const DEFAULT_PERSIST_MAX_DELAY: Duration = Duration::from_secs(2);

/// An active drag on one pane's resize handle.
///
/// Widths are always derived from `start_width` and `start_pointer_x`, never from the
/// previous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeGesture {
	pub panel_id: PanelId,
	pub start_pointer_x: f32,
	pub start_width: f32,
}

/// Immutable view of the store after a commit.
#[derive(Debug, Clone)]
pub struct LayoutSnapshot {
	pub revision: u64,
	pub panels: Arc<Vec<PanelEntry>>,
	pub config: SplitViewConfig,
	pub gesture: Option<ResizeGesture>,
}

impl LayoutSnapshot {
	pub fn is_resizing(&self) -> bool {
		self.gesture.is_some()
	}

	pub fn enabled(&self) -> bool {
		self.config.enabled
	}
}

/// What a commit changed. Delivered to observers in commit order.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutChange {
	Pinned(PanelId),
	Evicted(PanelId),
	Unpinned(PanelId),
	Moved { from: usize, to: usize },
	CollapseToggled { id: PanelId, collapsed: bool },
	ResizeStarted(PanelId),
	Resized { id: PanelId, width: f32 },
	ResizeEnded(PanelId),
	ResizeCancelled(PanelId),
	Cleared,
	EnabledChanged(bool),
	ConfigChanged,
}

pub type Observer = Box<dyn FnMut(&LayoutChange, &LayoutSnapshot) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum PinOutcome {
	Pinned(PanelEntry),
	/// The target was already pinned; nothing changed.
	AlreadyPinned(PanelEntry),
	/// Pinned after evicting the oldest panels (`EvictionPolicy::EvictOldest`), oldest first.
	Evicted { pinned: PanelEntry, evicted: Vec<PanelEntry> },
	/// Rejected; nothing changed.
	LimitReached { max: usize },
}

impl PinOutcome {
	pub fn entry(&self) -> Option<&PanelEntry> {
		match self {
			PinOutcome::Pinned(e) | PinOutcome::AlreadyPinned(e) => Some(e),
			PinOutcome::Evicted { pinned, .. } => Some(pinned),
			PinOutcome::LimitReached { .. } => None,
		}
	}

	pub fn changed(&self) -> bool {
		matches!(self, PinOutcome::Pinned(_) | PinOutcome::Evicted { .. })
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum PinToggle {
	Pinned(PinOutcome),
	Unpinned(PanelEntry),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
	Info,
	Warning,
}

/// User-facing message for a rejected operation, shown as a toast by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutNotice {
	pub kind: NoticeKind,
	pub message: String,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
	pub storage_key: String,
	/// Config used when nothing is stored, and for fields missing from the stored record.
	pub defaults: SplitViewConfig,
	/// Applied over the restored config on open.
	pub overrides: ConfigOverrides,
	pub persist_debounce: Duration,
	pub persist_max_delay: Duration,
}

impl Default for StoreOptions {
	fn default() -> Self {
		Self {
			storage_key: DEFAULT_STORAGE_KEY.to_string(),
			defaults: SplitViewConfig::default(),
			overrides: ConfigOverrides::default(),
			persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
			persist_max_delay: DEFAULT_PERSIST_MAX_DELAY,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
	Skip,
	Debounced,
	Now,
}

/// Single owner of the pinned panels, the split-view config and the resize gesture.
///
/// Every operation is synchronous. A rejected operation leaves the state untouched and
/// reports the rejection through its return value, never a panic.
pub struct LayoutStore {
	panels: Arc<Vec<PanelEntry>>,
	config: SplitViewConfig,
	gesture: Option<ResizeGesture>,
	container_width: Option<f32>,
	revision: u64,
	observers: Vec<(SubscriptionId, Observer)>,
	next_subscription: u64,
	notices: Vec<LayoutNotice>,
	persistence: LayoutPersistence,
	storage: SharedStorage,
	scheduler: WriteScheduler,
	clock: SharedClock,
}

impl std::fmt::Debug for LayoutStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LayoutStore")
			.field("panels", &self.panels)
			.field("config", &self.config)
			.field("gesture", &self.gesture)
			.field("container_width", &self.container_width)
			.field("revision", &self.revision)
			.field("observers", &self.observers.len())
			.finish_non_exhaustive()
	}
}

impl LayoutStore {
	/// Restore the layout from storage. Always yields a usable store.
	pub fn open(options: StoreOptions, storage: SharedStorage, clock: SharedClock) -> Self {
		let persistence = LayoutPersistence::new(options.storage_key, options.defaults);
		let mut restored = persistence.load(storage.as_ref());
		if !options.overrides.is_empty() {
			restored.config = options.overrides.apply(&restored.config).sanitized();
			let dropped = fit_panels(&mut restored.panels, &restored.config);
			if !dropped.is_empty() {
				warn!(
					dropped = dropped.len(),
					max = restored.config.max_panels,
					"restored panels exceed configured max_panels; closing the newest"
				);
			}
		}
		info!(
			panels = restored.panels.len(),
			enabled = restored.config.enabled,
			"split view layout restored"
		);

		Self {
			panels: Arc::new(restored.panels),
			config: restored.config,
			gesture: None,
			container_width: None,
			revision: 0,
			observers: Vec::new(),
			next_subscription: 1,
			notices: Vec::new(),
			persistence,
			storage,
			scheduler: WriteScheduler::new(options.persist_debounce, options.persist_max_delay),
			clock,
		}
	}

	pub fn panels(&self) -> &[PanelEntry] {
		&self.panels
	}

	pub fn config(&self) -> &SplitViewConfig {
		&self.config
	}

	pub fn gesture(&self) -> Option<&ResizeGesture> {
		self.gesture.as_ref()
	}

	pub fn is_resizing(&self) -> bool {
		self.gesture.is_some()
	}

	pub fn is_enabled(&self) -> bool {
		self.config.enabled
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub fn container_width(&self) -> Option<f32> {
		self.container_width
	}

	pub fn find(&self, id: PanelId) -> Option<&PanelEntry> {
		self.panels.iter().find(|p| p.id == id)
	}

	pub fn find_by_target(&self, target: &PanelTarget) -> Option<&PanelEntry> {
		self.panels.iter().find(|p| p.is_target(target))
	}

	pub fn is_pinned(&self, target: &PanelTarget) -> bool {
		self.find_by_target(target).is_some()
	}

	fn index_of(&self, id: PanelId) -> Option<usize> {
		self.panels.iter().position(|p| p.id == id)
	}

	pub fn snapshot(&self) -> LayoutSnapshot {
		LayoutSnapshot {
			revision: self.revision,
			panels: Arc::clone(&self.panels),
			config: self.config.clone(),
			gesture: self.gesture,
		}
	}

	pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
		let id = SubscriptionId(self.next_subscription);
		self.next_subscription += 1;
		self.observers.push((id, observer));
		id
	}

	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.observers.len();
		self.observers.retain(|(sid, _)| *sid != id);
		self.observers.len() != before
	}

	pub fn take_notices(&mut self) -> Vec<LayoutNotice> {
		std::mem::take(&mut self.notices)
	}

	fn notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
		self.notices.push(LayoutNotice {
			kind,
			message: message.into(),
		});
	}

	fn commit(&mut self, change: LayoutChange, persist: Persist) {
		self.revision += 1;
		if !self.observers.is_empty() {
			let snapshot = self.snapshot();
			for (_, observer) in self.observers.iter_mut() {
				observer(&change, &snapshot);
			}
		}

		let now = self.clock.now();
		match persist {
			Persist::Skip => {}
			Persist::Debounced => self.scheduler.schedule(now),
			Persist::Now => self.scheduler.commit_now(now),
		}
		if self.scheduler.due(now) {
			self.write_through();
		}
	}

	pub fn pin(&mut self, draft: PanelDraft) -> PinOutcome {
		let target = draft.target();
		if let Some(existing) = self.find_by_target(&target) {
			let existing = existing.clone();
			debug!(target = %target, id = %existing.id, "pin: already pinned");
			self.notice(NoticeKind::Info, format!("{} is already pinned", existing.title));
			return PinOutcome::AlreadyPinned(existing);
		}

		let max = self.config.max_panels;
		let mut evicted = Vec::new();
		if self.panels.len() >= max {
			match self.config.eviction {
				EvictionPolicy::Reject => {
					debug!(target = %target, max, "pin: limit reached");
					self.notice(NoticeKind::Warning, format!("Split view is limited to {max} panels"));
					return PinOutcome::LimitReached { max };
				}
				EvictionPolicy::EvictOldest => {
					let panels = Arc::make_mut(&mut self.panels);
					let surplus = panels.len() + 1 - max;
					let removed: Vec<PanelEntry> = panels.drain(..surplus).collect();
					for old in &removed {
						self.drop_gesture_on(old.id);
						info!(id = %old.id, target = %old.target(), "pin: evicted oldest panel");
						self.commit(LayoutChange::Evicted(old.id), Persist::Skip);
					}
					evicted = removed;
				}
			}
		}

		let entry = PanelEntry::from_draft(draft, self.config.default_width());
		Arc::make_mut(&mut self.panels).push(entry.clone());
		info!(id = %entry.id, target = %target, width = entry.width, "panel pinned");
		self.commit(LayoutChange::Pinned(entry.id), Persist::Debounced);

		if evicted.is_empty() {
			PinOutcome::Pinned(entry)
		} else {
			PinOutcome::Evicted { pinned: entry, evicted }
		}
	}

	pub fn unpin(&mut self, id: PanelId) -> Option<PanelEntry> {
		let Some(index) = self.index_of(id) else {
			debug!(%id, "unpin: no such panel");
			return None;
		};
		self.remove_at(index)
	}

	pub fn unpin_by_target(&mut self, kind: PanelKind, target_id: &TargetId) -> Option<PanelEntry> {
		let target = PanelTarget::new(kind, target_id.clone());
		let id = self.find_by_target(&target)?.id;
		self.unpin(id)
	}

	/// Close the panel at a list position.
	pub fn unpin_at(&mut self, index: usize) -> Option<PanelEntry> {
		if index >= self.panels.len() {
			debug!(index, len = self.panels.len(), "unpin_at: index out of range");
			return None;
		}
		self.remove_at(index)
	}

	fn remove_at(&mut self, index: usize) -> Option<PanelEntry> {
		let removed = Arc::make_mut(&mut self.panels).remove(index);
		self.drop_gesture_on(removed.id);
		info!(id = %removed.id, target = %removed.target(), "panel unpinned");
		self.commit(LayoutChange::Unpinned(removed.id), Persist::Debounced);
		Some(removed)
	}

	/// End a gesture whose panel is going away. The width is not restored.
	fn drop_gesture_on(&mut self, id: PanelId) {
		if self.gesture.is_some_and(|g| g.panel_id == id) {
			debug!(%id, "cancelling resize on removed panel");
			self.gesture = None;
			self.commit(LayoutChange::ResizeCancelled(id), Persist::Skip);
		}
	}

	/// Pin affordance: unpin when pinned, pin otherwise.
	pub fn toggle_pin(&mut self, draft: PanelDraft) -> PinToggle {
		match self.find_by_target(&draft.target()).map(|p| p.id) {
			Some(id) => match self.unpin(id) {
				Some(entry) => PinToggle::Unpinned(entry),
				None => PinToggle::Pinned(self.pin(draft)),
			},
			None => PinToggle::Pinned(self.pin(draft)),
		}
	}

	pub fn move_panel(&mut self, from: usize, to: usize) -> bool {
		let len = self.panels.len();
		if from >= len || to >= len || from == to {
			debug!(from, to, len, "move_panel: ignored");
			return false;
		}
		let panels = Arc::make_mut(&mut self.panels);
		let entry = panels.remove(from);
		panels.insert(to, entry);
		self.commit(LayoutChange::Moved { from, to }, Persist::Debounced);
		true
	}

	/// Returns the new collapsed state. The stored width is kept for un-collapsing.
	pub fn toggle_collapse(&mut self, id: PanelId) -> Option<bool> {
		let index = self.index_of(id)?;
		if self.gesture.is_some_and(|g| g.panel_id == id) {
			self.end_resize();
		}
		let panel = &mut Arc::make_mut(&mut self.panels)[index];
		panel.collapsed = !panel.collapsed;
		let collapsed = panel.collapsed;
		self.commit(LayoutChange::CollapseToggled { id, collapsed }, Persist::Debounced);
		Some(collapsed)
	}

	/// Container width as last observed by the responsive coordinator. Bounds resizes so
	/// the main content area keeps `main_panel_min_width`.
	pub fn set_container_width(&mut self, width: Option<f32>) {
		self.container_width = width.filter(|w| w.is_finite() && *w >= 0.0);
	}

	fn width_cap(&self, active: PanelId) -> f32 {
		let cfg = &self.config;
		let Some(container) = self.container_width else {
			return cfg.pane_max_width;
		};
		let others: f32 = self
			.panels
			.iter()
			.filter(|p| p.id != active)
			.map(|p| p.effective_width(cfg.collapsed_width))
			.sum();
		let room = container - cfg.main_panel_min_width - others;
		room.min(cfg.pane_max_width).max(cfg.pane_min_width)
	}

	pub fn start_resize(&mut self, id: PanelId, pointer_x: f32) -> bool {
		if let Some(active) = self.gesture {
			debug!(requested = %id, active = %active.panel_id, "start_resize: gesture already active");
			return false;
		}
		if !pointer_x.is_finite() {
			debug!(%id, "start_resize: non-finite pointer position");
			return false;
		}
		let Some(panel) = self.find(id) else {
			debug!(%id, "start_resize: no such panel");
			return false;
		};
		if panel.collapsed {
			debug!(%id, "start_resize: panel is collapsed");
			return false;
		}

		self.gesture = Some(ResizeGesture {
			panel_id: id,
			start_pointer_x: pointer_x,
			start_width: panel.width,
		});
		self.commit(LayoutChange::ResizeStarted(id), Persist::Skip);
		true
	}

	/// Apply the pointer position to the active gesture. Safe to call on every input event.
	pub fn resize(&mut self, pointer_x: f32) -> bool {
		let Some(gesture) = self.gesture else {
			debug!("resize: no active gesture");
			return false;
		};
		if !pointer_x.is_finite() {
			return false;
		}
		let Some(index) = self.index_of(gesture.panel_id) else {
			warn!(id = %gesture.panel_id, "resize: gesture target vanished; dropping gesture");
			self.gesture = None;
			return false;
		};

		let delta = pointer_x - gesture.start_pointer_x;
		let cap = self.width_cap(gesture.panel_id);
		let width = (gesture.start_width + delta).clamp(self.config.pane_min_width, cap);

		let panel = &self.panels[index];
		if panel.width == width {
			return true;
		}
		Arc::make_mut(&mut self.panels)[index].width = width;
		self.commit(
			LayoutChange::Resized {
				id: gesture.panel_id,
				width,
			},
			Persist::Skip,
		);
		true
	}

	pub fn end_resize(&mut self) -> bool {
		let Some(gesture) = self.gesture.take() else {
			debug!("end_resize: no active gesture");
			return false;
		};
		if let Some(panel) = self.find(gesture.panel_id) {
			info!(id = %gesture.panel_id, width = panel.width, "resize committed");
		}
		self.commit(LayoutChange::ResizeEnded(gesture.panel_id), Persist::Now);
		true
	}

	/// Restore the width captured at gesture start, within the current bounds, then end
	/// the gesture.
	pub fn cancel_resize(&mut self) -> bool {
		let Some(gesture) = self.gesture.take() else {
			return false;
		};
		if let Some(index) = self.index_of(gesture.panel_id) {
			let width = self.config.clamp_pane_width(gesture.start_width);
			Arc::make_mut(&mut self.panels)[index].width = width;
		}
		debug!(id = %gesture.panel_id, "resize cancelled");
		self.commit(LayoutChange::ResizeCancelled(gesture.panel_id), Persist::Now);
		true
	}

	pub fn clear_all(&mut self) {
		if let Some(g) = self.gesture {
			self.drop_gesture_on(g.panel_id);
		}
		let count = self.panels.len();
		Arc::make_mut(&mut self.panels).clear();
		info!(count, "cleared all panels");
		self.commit(LayoutChange::Cleared, Persist::Debounced);
	}

	/// Flip the global split-view preference. Returns the new value.
	pub fn toggle(&mut self) -> bool {
		let enabled = !self.config.enabled;
		self.set_enabled(enabled);
		enabled
	}

	pub fn set_enabled(&mut self, enabled: bool) {
		if self.config.enabled == enabled {
			return;
		}
		self.config.enabled = enabled;
		info!(enabled, "split view toggled");
		self.commit(LayoutChange::EnabledChanged(enabled), Persist::Debounced);
	}

	/// Replace the config. Existing widths are re-clamped; when `max_panels` drops below
	/// the pinned count the newest panels are closed. Returns the closed panels.
	pub fn update_config(&mut self, config: SplitViewConfig) -> Vec<PanelEntry> {
		let config = config.sanitized();
		if config == self.config {
			return Vec::new();
		}
		self.config = config;

		let needs_fit = self.panels.len() > self.config.max_panels
			|| self
				.panels
				.iter()
				.any(|p| self.config.clamp_pane_width(p.width) != p.width);
		let dropped = if needs_fit {
			fit_panels(Arc::make_mut(&mut self.panels), &self.config)
		} else {
			Vec::new()
		};

		for old in &dropped {
			self.drop_gesture_on(old.id);
			info!(id = %old.id, target = %old.target(), "panel closed by lowered max_panels");
			self.commit(LayoutChange::Evicted(old.id), Persist::Skip);
		}
		if !dropped.is_empty() {
			let max = self.config.max_panels;
			self.notice(
				NoticeKind::Warning,
				format!("Split view is now limited to {max} panels; closed {}", dropped.len()),
			);
		}
		self.commit(LayoutChange::ConfigChanged, Persist::Debounced);
		dropped
	}

	pub fn has_pending_write(&self) -> bool {
		self.scheduler.is_pending()
	}

	/// Write a pending layout if its debounce has elapsed. Call from the host's idle loop.
	pub fn tick(&mut self) -> bool {
		if self.scheduler.due(self.clock.now()) {
			return self.write_through();
		}
		false
	}

	/// Write a pending layout immediately, e.g. before the window unloads.
	pub fn flush(&mut self) -> bool {
		if !self.scheduler.is_pending() {
			return true;
		}
		self.write_through()
	}

	fn write_through(&mut self) -> bool {
		match self
			.persistence
			.save(self.storage.as_ref(), &self.config, &self.panels)
		{
			Ok(()) => {
				debug!(revision = self.revision, "layout persisted");
				self.scheduler.mark_flushed();
				true
			}
			Err(e) => {
				warn!(error = %e, "failed to persist layout; will retry");
				self.scheduler.mark_failed(self.clock.now());
				false
			}
		}
	}
}

/// Clamp widths into the config's bounds and close panels beyond `max_panels`, newest
/// first. Returns the closed panels in list order.
fn fit_panels(panels: &mut Vec<PanelEntry>, config: &SplitViewConfig) -> Vec<PanelEntry> {
	for p in panels.iter_mut() {
		p.width = config.clamp_pane_width(p.width);
	}
	if panels.len() > config.max_panels {
		panels.split_off(config.max_panels)
	} else {
		Vec::new()
	}
}
