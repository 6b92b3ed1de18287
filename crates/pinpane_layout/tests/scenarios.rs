#![forbid(unsafe_code)]

mod common;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pinpane_layout::domain::{PanelKind, TargetId};
use pinpane_layout::{
	LayoutChange, PinOutcome, ResponsiveCoordinator, SplitViewConfig, ViewportEvent, compose,
};

use common::{Harness, channel, draft};

#[test]
fn pin_limit_rejects_fourth_panel() {
	let mut h = Harness::new(SplitViewConfig {
		max_panels: 3,
		pane_min_width: 280.0,
		pane_max_width: 600.0,
		main_panel_min_width: 400.0,
		..SplitViewConfig::default()
	});

	for id in ["general", "random", "dev"] {
		assert!(matches!(h.store.pin(channel(id)), PinOutcome::Pinned(_)));
	}
	assert_eq!(h.store.panels().len(), 3);

	let before = h.store.revision();
	assert_eq!(h.store.pin(channel("ops")), PinOutcome::LimitReached { max: 3 });
	assert_eq!(h.store.panels().len(), 3);
	assert_eq!(h.store.revision(), before);
	assert_eq!(h.store.take_notices().len(), 1);
}

#[test]
fn drag_clamps_to_max_and_persists_on_release() {
	let mut h = Harness::new(SplitViewConfig::default());
	let id = h.store.pin(channel("general")).entry().unwrap().id;
	assert_eq!(h.store.find(id).unwrap().width, 360.0);

	assert!(h.store.start_resize(id, 500.0));
	assert!(h.store.resize(800.0));
	assert_eq!(h.store.find(id).unwrap().width, 600.0);
	assert!(h.store.end_resize());

	let reopened = h.reopen();
	assert_eq!(reopened.panels().len(), 1);
	assert_eq!(reopened.panels()[0].id, id);
	assert_eq!(reopened.panels()[0].width, 600.0);
}

#[test]
fn unpin_by_target_then_repin_gets_new_id() {
	let mut h = Harness::new(SplitViewConfig::default());
	let first = h.store.pin(channel("general")).entry().unwrap().id;

	let removed = h
		.store
		.unpin_by_target(PanelKind::Channel, &TargetId::new("general").unwrap())
		.unwrap();
	assert_eq!(removed.id, first);
	assert!(h.store.panels().is_empty());

	let second = h.store.pin(channel("general")).entry().unwrap().id;
	assert_ne!(first, second);
	assert_eq!(h.store.panels().len(), 1);
}

#[test]
fn narrow_viewport_hides_without_unpinning() {
	let mut h = Harness::new(SplitViewConfig::default());
	h.store.pin(channel("general"));
	h.store.pin(draft(PanelKind::Dm, "alice"));

	let t0 = Instant::now();
	let mut viewport = ResponsiveCoordinator::new(1024.0, Duration::from_millis(100));
	let mut events = VecDeque::from([ViewportEvent::ContainerResized(1440.0)]);
	viewport.drain(&mut events, &mut h.store, t0);
	assert!(viewport.should_render(&h.store.snapshot()));

	events.push_back(ViewportEvent::ContainerResized(800.0));
	viewport.drain(&mut events, &mut h.store, t0 + Duration::from_millis(10));
	viewport.drain(&mut events, &mut h.store, t0 + Duration::from_millis(200));
	assert!(!viewport.is_desktop_eligible());
	assert_eq!(h.store.panels().len(), 2);
	assert!(!compose(&h.store.snapshot(), &viewport).visible);

	let revision = h.store.revision();
	events.push_back(ViewportEvent::ContainerResized(1280.0));
	viewport.drain(&mut events, &mut h.store, t0 + Duration::from_millis(300));
	viewport.drain(&mut events, &mut h.store, t0 + Duration::from_millis(450));
	assert!(viewport.is_desktop_eligible());
	let view = compose(&h.store.snapshot(), &viewport);
	assert!(view.visible);
	assert_eq!(view.panes.len(), 2);
	assert_eq!(h.store.revision(), revision);
}

#[test]
fn observers_see_changes_in_commit_order() {
	let mut h = Harness::new(SplitViewConfig::default());
	let seen: Arc<Mutex<Vec<(u64, LayoutChange)>>> = Arc::default();
	let sink = Arc::clone(&seen);
	let sub = h.store.subscribe(Box::new(move |change, snap| {
		sink.lock().push((snap.revision, change.clone()));
	}));

	let a = h.store.pin(channel("a")).entry().unwrap().id;
	let b = h.store.pin(channel("b")).entry().unwrap().id;
	h.store.move_panel(1, 0);
	h.store.toggle_collapse(a);
	h.store.unpin(b);

	let got = seen.lock().clone();
	assert_eq!(
		got.iter().map(|(_, c)| c.clone()).collect::<Vec<_>>(),
		vec![
			LayoutChange::Pinned(a),
			LayoutChange::Pinned(b),
			LayoutChange::Moved { from: 1, to: 0 },
			LayoutChange::CollapseToggled { id: a, collapsed: true },
			LayoutChange::Unpinned(b),
		]
	);
	assert!(got.windows(2).all(|w| w[0].0 < w[1].0));

	assert!(h.store.unsubscribe(sub));
	h.store.clear_all();
	assert_eq!(seen.lock().len(), 5);
}

#[test]
fn discrete_changes_are_coalesced_into_one_write() {
	let mut h = Harness::new(SplitViewConfig::default());
	h.store.pin(channel("a"));
	h.store.pin(channel("b"));
	h.store.move_panel(0, 1);
	assert_eq!(h.storage.write_count(), 0);
	assert!(h.store.has_pending_write());

	h.clock.advance(Duration::from_millis(100));
	assert!(!h.store.tick());

	h.clock.advance(Duration::from_millis(200));
	assert!(h.store.tick());
	assert_eq!(h.storage.write_count(), 1);
	assert!(!h.store.has_pending_write());

	let reopened = h.reopen();
	let order: Vec<&str> = reopened.panels().iter().map(|p| p.target_id.as_str()).collect();
	assert_eq!(order, ["b", "a"]);
}

#[test]
fn drag_frames_never_write() {
	let mut h = Harness::new(SplitViewConfig::default());
	let id = h.store.pin(channel("a")).entry().unwrap().id;
	h.store.flush();
	let writes = h.storage.write_count();

	h.store.start_resize(id, 0.0);
	for x in 1..50 {
		h.store.resize(x as f32);
		h.clock.advance(Duration::from_millis(16));
		h.store.tick();
	}
	assert_eq!(h.storage.write_count(), writes);
	h.store.end_resize();
	assert_eq!(h.storage.write_count(), writes + 1);
}

#[test]
fn failed_write_is_retried() {
	let mut h = Harness::new(SplitViewConfig::default());
	h.storage.set_disabled(true);
	h.store.pin(channel("a"));
	assert!(!h.store.flush());
	assert!(h.store.has_pending_write());
	assert_eq!(h.store.panels().len(), 1);

	h.storage.set_disabled(false);
	h.clock.advance(Duration::from_secs(1));
	assert!(h.store.tick());
	assert_eq!(h.reopen().panels().len(), 1);
}

#[test]
fn disabled_preference_survives_reload() {
	let mut h = Harness::new(SplitViewConfig::default());
	h.store.pin(channel("a"));
	assert!(!h.store.toggle());
	h.store.flush();

	let reopened = h.reopen();
	assert!(!reopened.is_enabled());
	assert_eq!(reopened.panels().len(), 1);
}

#[test]
fn corrupt_storage_starts_empty() {
	let storage = pinpane_layout::MemoryStorage::new();
	pinpane_layout::KeyValueStorage::set(&storage, pinpane_layout::persistence::DEFAULT_STORAGE_KEY, "{not json")
		.unwrap();
	let h = Harness::with_storage(SplitViewConfig::default(), storage);
	assert!(h.store.panels().is_empty());
	assert!(h.store.is_enabled());
}

#[test]
fn settings_file_limits_apply_to_a_stored_layout() {
	let mut h = Harness::new(SplitViewConfig::default());
	for id in ["a", "b", "c"] {
		h.store.pin(channel(id));
	}
	assert!(h.store.flush());

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("layout.toml");
	std::fs::write(&path, "[split_view]\nmax_panels = 2\nenabled = false\n").unwrap();
	let settings = pinpane_layout::load_settings_from_path(&path).unwrap();

	let store = pinpane_layout::LayoutStore::open(
		settings.store_options(),
		Arc::new(h.storage.clone()),
		Arc::new(h.clock.clone()),
	);
	assert_eq!(store.config().max_panels, 2);
	assert!(!store.is_enabled());
	let order: Vec<&str> = store.panels().iter().map(|p| p.target_id.as_str()).collect();
	assert_eq!(order, ["a", "b"]);
}
