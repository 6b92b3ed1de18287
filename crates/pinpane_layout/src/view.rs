#![forbid(unsafe_code)]

use pinpane_domain::{PanelId, PanelKind, ServerId, TargetId};

use crate::responsive::ResponsiveCoordinator;
use crate::store::LayoutSnapshot;

/// One pane as the renderer should place it, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneSlot {
	pub id: PanelId,
	pub kind: PanelKind,
	pub target_id: TargetId,
	pub server_id: Option<ServerId>,
	pub title: String,
	pub icon_url: Option<String>,
	/// On-screen width; the collapsed width for collapsed panes.
	pub width: f32,
	pub collapsed: bool,
	pub resizing: bool,
}

/// Input for the layout renderer: a main region plus side panes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutView {
	pub visible: bool,
	pub main_width: Option<f32>,
	pub panes: Vec<PaneSlot>,
	/// Panes plus the main minimum exceed the container; the renderer scrolls horizontally.
	pub overflow: bool,
}

impl LayoutView {
	pub fn panes_width(&self) -> f32 {
		self.panes.iter().map(|p| p.width).sum()
	}
}

pub fn compose(snapshot: &LayoutSnapshot, viewport: &ResponsiveCoordinator) -> LayoutView {
	let visible = viewport.should_render(snapshot);
	let container = viewport.width();

	if !visible {
		return LayoutView {
			visible,
			main_width: container,
			panes: Vec::new(),
			overflow: false,
		};
	}

	let cfg = &snapshot.config;
	let active = snapshot.gesture.map(|g| g.panel_id);
	let panes: Vec<PaneSlot> = snapshot
		.panels
		.iter()
		.map(|p| PaneSlot {
			id: p.id,
			kind: p.kind,
			target_id: p.target_id.clone(),
			server_id: p.server_id.clone(),
			title: p.title.clone(),
			icon_url: p.icon_url.clone(),
			width: p.effective_width(cfg.collapsed_width),
			collapsed: p.collapsed,
			resizing: active == Some(p.id),
		})
		.collect();

	let panes_width: f32 = panes.iter().map(|p| p.width).sum();
	let (main_width, overflow) = match container {
		Some(total) => {
			let left = total - panes_width;
			(Some(left.max(cfg.main_panel_min_width)), left < cfg.main_panel_min_width)
		}
		None => (None, false),
	};

	LayoutView {
		visible,
		main_width,
		panes,
		overflow,
	}
}
