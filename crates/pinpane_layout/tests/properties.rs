#![forbid(unsafe_code)]

mod common;

use std::collections::HashSet;

use pinpane_layout::domain::PanelKind;
use pinpane_layout::{EvictionPolicy, LayoutStore, SplitViewConfig};
use proptest::prelude::*;

use common::{Harness, draft};

#[derive(Debug, Clone)]
enum Op {
	Pin(PanelKind, u8),
	TogglePin(PanelKind, u8),
	UnpinAt(usize),
	Move(usize, usize),
	Collapse(usize),
	Drag(usize, f32, f32),
	StartResize(usize, f32),
	EndResize,
	CancelResize,
	Toggle,
	ClearAll,
	UpdateConfig(usize, f32, f32),
}

fn kind_strategy() -> impl Strategy<Value = PanelKind> {
	prop_oneof![Just(PanelKind::Channel), Just(PanelKind::Dm), Just(PanelKind::Thread)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
	prop_oneof![
		4 => (kind_strategy(), 0u8..6).prop_map(|(k, t)| Op::Pin(k, t)),
		2 => (kind_strategy(), 0u8..6).prop_map(|(k, t)| Op::TogglePin(k, t)),
		1 => (0usize..6).prop_map(Op::UnpinAt),
		1 => (0usize..6, 0usize..6).prop_map(|(a, b)| Op::Move(a, b)),
		1 => (0usize..6).prop_map(Op::Collapse),
		3 => (0usize..6, -2000f32..2000.0, -2000f32..2000.0).prop_map(|(i, a, b)| Op::Drag(i, a, b)),
		1 => (0usize..6, -500f32..500.0).prop_map(|(i, x)| Op::StartResize(i, x)),
		1 => Just(Op::EndResize),
		1 => Just(Op::CancelResize),
		1 => Just(Op::Toggle),
		1 => Just(Op::ClearAll),
		1 => (1usize..5, 200f32..400.0, 300f32..700.0).prop_map(|(max, min, max_w)| Op::UpdateConfig(max, min, max_w)),
	]
}

fn config_strategy() -> impl Strategy<Value = SplitViewConfig> {
	(1usize..5, any::<bool>()).prop_map(|(max_panels, evict)| SplitViewConfig {
		max_panels,
		eviction: if evict {
			EvictionPolicy::EvictOldest
		} else {
			EvictionPolicy::Reject
		},
		..SplitViewConfig::default()
	})
}

fn target(t: u8) -> String {
	format!("t{t}")
}

fn panel_at(store: &LayoutStore, index: usize) -> Option<pinpane_layout::domain::PanelId> {
	let len = store.panels().len();
	if len == 0 {
		return None;
	}
	Some(store.panels()[index % len].id)
}

fn apply(store: &mut LayoutStore, op: &Op) {
	match op {
		Op::Pin(k, t) => {
			store.pin(draft(*k, &target(*t)));
		}
		Op::TogglePin(k, t) => {
			store.toggle_pin(draft(*k, &target(*t)));
		}
		Op::UnpinAt(i) => {
			store.unpin_at(*i);
		}
		Op::Move(a, b) => {
			store.move_panel(*a, *b);
		}
		Op::Collapse(i) => {
			if let Some(id) = panel_at(store, *i) {
				store.toggle_collapse(id);
			}
		}
		Op::Drag(i, from, to) => {
			if let Some(id) = panel_at(store, *i)
				&& store.start_resize(id, *from)
			{
				store.resize(*to);
				store.end_resize();
			}
		}
		Op::StartResize(i, x) => {
			if let Some(id) = panel_at(store, *i) {
				store.start_resize(id, *x);
			}
		}
		Op::EndResize => {
			store.end_resize();
		}
		Op::CancelResize => {
			store.cancel_resize();
		}
		Op::Toggle => {
			store.toggle();
		}
		Op::ClearAll => store.clear_all(),
		Op::UpdateConfig(max_panels, pane_min_width, pane_max_width) => {
			let config = SplitViewConfig {
				max_panels: *max_panels,
				pane_min_width: *pane_min_width,
				pane_max_width: *pane_max_width,
				..store.config().clone()
			};
			store.update_config(config);
		}
	}
}

fn check_structure(store: &LayoutStore) -> Result<(), TestCaseError> {
	let cfg = store.config();
	prop_assert!(store.panels().len() <= cfg.max_panels);

	let targets: HashSet<_> = store.panels().iter().map(|p| p.target()).collect();
	prop_assert_eq!(targets.len(), store.panels().len());
	let ids: HashSet<_> = store.panels().iter().map(|p| p.id).collect();
	prop_assert_eq!(ids.len(), store.panels().len());

	for p in store.panels() {
		prop_assert!(p.width >= cfg.pane_min_width && p.width <= cfg.pane_max_width, "width {}", p.width);
	}

	if let Some(g) = store.gesture() {
		prop_assert!(store.find(g.panel_id).is_some());
	}
	Ok(())
}

proptest! {
	#[test]
	fn store_invariants_hold_for_any_sequence(
		cfg in config_strategy(),
		ops in prop::collection::vec(op_strategy(), 0..80),
	) {
		let mut h = Harness::new(cfg);
		for op in &ops {
			apply(&mut h.store, op);
			check_structure(&h.store)?;
		}
	}

	#[test]
	fn only_one_gesture_at_a_time(
		starts in prop::collection::vec((0usize..3, -1000f32..1000.0), 1..20),
	) {
		let mut h = Harness::new(SplitViewConfig::default());
		for t in 0..3u8 {
			h.store.pin(draft(PanelKind::Dm, &target(t)));
		}

		let (first_index, first_x) = starts[0];
		let first = h.store.panels()[first_index].id;
		prop_assert!(h.store.start_resize(first, first_x));
		for (index, x) in &starts[1..] {
			let id = h.store.panels()[*index].id;
			prop_assert!(!h.store.start_resize(id, *x));
			prop_assert_eq!(h.store.gesture().map(|g| g.panel_id), Some(first));
		}
		prop_assert!(h.store.end_resize());
		prop_assert!(!h.store.is_resizing());
	}

	#[test]
	fn resize_tracks_pointer_within_bounds(
		start in -1000f32..1000.0,
		moves in prop::collection::vec(-3000f32..3000.0, 1..30),
	) {
		let mut h = Harness::new(SplitViewConfig::default());
		let id = h.store.pin(draft(PanelKind::Dm, "a")).entry().unwrap().id;
		let start_width = h.store.find(id).unwrap().width;
		prop_assert!(h.store.start_resize(id, start));

		for x in &moves {
			h.store.resize(*x);
			let expected = (start_width + (x - start)).clamp(280.0, 600.0);
			let width = h.store.find(id).unwrap().width;
			prop_assert!((width - expected).abs() < 0.01, "width {} expected {}", width, expected);
		}
	}

	#[test]
	fn main_region_keeps_its_floor(
		n in 1usize..4,
		slack in 0f32..400.0,
		drags in prop::collection::vec((0usize..4, -2000f32..2000.0), 1..20),
	) {
		let cfg = SplitViewConfig {
			default_pane_width: 280.0,
			..SplitViewConfig::default()
		};
		let container = cfg.main_panel_min_width + n as f32 * cfg.pane_min_width + slack;
		let mut h = Harness::new(cfg.clone());
		for t in 0..n {
			h.store.pin(draft(PanelKind::Dm, &target(t as u8)));
		}
		h.store.set_container_width(Some(container));

		for (index, x) in &drags {
			let id = h.store.panels()[index % n].id;
			prop_assert!(h.store.start_resize(id, 0.0));
			h.store.resize(*x);
			h.store.end_resize();

			let panes: f32 = h.store.panels().iter().map(|p| p.width).sum();
			prop_assert!(
				container - panes >= cfg.main_panel_min_width - 0.01,
				"container {} panes {}",
				container,
				panes
			);
		}
	}

	#[test]
	fn flushed_layout_survives_reload(
		cfg in config_strategy(),
		ops in prop::collection::vec(op_strategy(), 0..40),
	) {
		let mut h = Harness::new(cfg);
		for op in &ops {
			apply(&mut h.store, op);
		}
		h.store.end_resize();
		// Leave a write pending even when no op changed anything.
		h.store.toggle();
		h.store.toggle();
		prop_assert!(h.store.flush());

		let reopened = h.reopen();
		prop_assert_eq!(reopened.panels(), h.store.panels());
		prop_assert_eq!(reopened.config(), h.store.config());
	}
}
