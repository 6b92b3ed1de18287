#![forbid(unsafe_code)]

use pinpane_domain::PanelId;
use tracing::debug;

use crate::input::{InputEvent, InputPort, Key, Modifiers};
use crate::keybinds::ResolvedKeybinds;
use crate::store::LayoutStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureOwner {
	Pointer(u32),
	Touch(u64),
}

/// Result of feeding one event to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
	Ignored,
	Started,
	Moved,
	Ended,
	Cancelled,
	KeyboardResized,
	Toggled(bool),
	Cleared,
}

/// Turns pointer, touch and keyboard input into store resize calls.
///
/// Every gesture it starts is ended: by the matching pointer/touch release, by capture
/// loss, by window blur or hidden visibility, or by escape.
#[derive(Debug, Clone)]
pub struct ResizeGestureController {
	keybinds: ResolvedKeybinds,
	owner: Option<GestureOwner>,
}

impl Default for ResizeGestureController {
	fn default() -> Self {
		Self::new(ResolvedKeybinds::default())
	}
}

impl ResizeGestureController {
	pub fn new(keybinds: ResolvedKeybinds) -> Self {
		Self { keybinds, owner: None }
	}

	pub fn keybinds(&self) -> &ResolvedKeybinds {
		&self.keybinds
	}

	pub fn is_tracking(&self) -> bool {
		self.owner.is_some()
	}

	pub fn drain(&mut self, port: &mut dyn InputPort, store: &mut LayoutStore) -> usize {
		let mut n = 0;
		while let Some(event) = port.next_event() {
			self.handle(store, event);
			n += 1;
		}
		n
	}

	pub fn handle(&mut self, store: &mut LayoutStore, event: InputEvent) -> Handled {
		// The store may have dropped the gesture on its own (panel unpinned, cleared).
		if self.owner.is_some() && !store.is_resizing() {
			debug!("gesture ended by the store; releasing pointer");
			self.owner = None;
		}

		match event {
			InputEvent::PointerDown { pointer_id, panel, x } => self.begin(store, GestureOwner::Pointer(pointer_id), panel, x),
			InputEvent::TouchStart { touch_id, panel, x } => self.begin(store, GestureOwner::Touch(touch_id), panel, x),
			InputEvent::PointerMove { pointer_id, x } => self.motion(store, GestureOwner::Pointer(pointer_id), x),
			InputEvent::TouchMove { touch_id, x } => self.motion(store, GestureOwner::Touch(touch_id), x),
			InputEvent::PointerUp { pointer_id }
			| InputEvent::PointerCancel { pointer_id }
			| InputEvent::LostPointerCapture { pointer_id } => self.finish(store, GestureOwner::Pointer(pointer_id)),
			InputEvent::TouchEnd { touch_id } | InputEvent::TouchCancel { touch_id } => {
				self.finish(store, GestureOwner::Touch(touch_id))
			}
			InputEvent::WindowBlur | InputEvent::VisibilityHidden => {
				if self.owner.take().is_some() && store.end_resize() {
					debug!("window lost focus mid-gesture; gesture ended");
					return Handled::Ended;
				}
				Handled::Ignored
			}
			InputEvent::Key {
				key,
				modifiers,
				focused_panel,
			} => self.key(store, key, modifiers, focused_panel),
		}
	}

	fn begin(&mut self, store: &mut LayoutStore, owner: GestureOwner, panel: PanelId, x: f32) -> Handled {
		if self.owner.is_some() {
			debug!(?owner, "second pointer ignored while a gesture is active");
			return Handled::Ignored;
		}
		if store.start_resize(panel, x) {
			self.owner = Some(owner);
			Handled::Started
		} else {
			Handled::Ignored
		}
	}

	fn motion(&mut self, store: &mut LayoutStore, owner: GestureOwner, x: f32) -> Handled {
		if self.owner != Some(owner) {
			return Handled::Ignored;
		}
		if store.resize(x) { Handled::Moved } else { Handled::Ignored }
	}

	fn finish(&mut self, store: &mut LayoutStore, owner: GestureOwner) -> Handled {
		if self.owner != Some(owner) {
			return Handled::Ignored;
		}
		self.owner = None;
		if store.end_resize() { Handled::Ended } else { Handled::Ignored }
	}

	fn key(&mut self, store: &mut LayoutStore, key: Key, modifiers: Modifiers, focused: Option<PanelId>) -> Handled {
		if key == Key::Escape {
			if self.owner.take().is_some() && store.cancel_resize() {
				return Handled::Cancelled;
			}
			return Handled::Ignored;
		}

		if self.keybinds.toggle_split_view.matches(key, modifiers) {
			return Handled::Toggled(store.toggle());
		}
		if self.keybinds.clear_panels.matches(key, modifiers) {
			self.owner = None;
			store.clear_all();
			return Handled::Cleared;
		}

		let direction = match key {
			Key::ArrowLeft => -1.0,
			Key::ArrowRight => 1.0,
			_ => return Handled::Ignored,
		};
		let Some(panel) = focused else {
			return Handled::Ignored;
		};
		if self.owner.is_some() || modifiers.ctrl || modifiers.alt || modifiers.meta {
			return Handled::Ignored;
		}

		let step = if modifiers.shift {
			self.keybinds.resize_large_step
		} else {
			self.keybinds.resize_step
		};

		// One key press is a complete gesture.
		if !store.start_resize(panel, 0.0) {
			return Handled::Ignored;
		}
		store.resize(direction * step);
		store.end_resize();
		Handled::KeyboardResized
	}
}
