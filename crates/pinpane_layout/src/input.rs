#![forbid(unsafe_code)]

use std::collections::VecDeque;

use pinpane_domain::PanelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
	pub ctrl: bool,
	pub alt: bool,
	pub shift: bool,
	pub meta: bool,
}

impl Modifiers {
	pub const NONE: Modifiers = Modifiers {
		ctrl: false,
		alt: false,
		shift: false,
		meta: false,
	};

	pub const SHIFT: Modifiers = Modifiers {
		ctrl: false,
		alt: false,
		shift: true,
		meta: false,
	};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
	ArrowLeft,
	ArrowRight,
	ArrowUp,
	ArrowDown,
	Escape,
	Char(char),
	Other,
}

/// Input the gesture controller reacts to. Produced by whatever owns the real window.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
	PointerDown { pointer_id: u32, panel: PanelId, x: f32 },
	PointerMove { pointer_id: u32, x: f32 },
	PointerUp { pointer_id: u32 },
	PointerCancel { pointer_id: u32 },
	LostPointerCapture { pointer_id: u32 },
	TouchStart { touch_id: u64, panel: PanelId, x: f32 },
	TouchMove { touch_id: u64, x: f32 },
	TouchEnd { touch_id: u64 },
	TouchCancel { touch_id: u64 },
	/// `focused_panel` is the pane whose resize handle has keyboard focus, if any.
	Key {
		key: Key,
		modifiers: Modifiers,
		focused_panel: Option<PanelId>,
	},
	WindowBlur,
	VisibilityHidden,
}

/// Source of input events, listened to at window level.
pub trait InputPort {
	fn next_event(&mut self) -> Option<InputEvent>;
}

#[derive(Debug, Clone, Default)]
pub struct QueuedInput {
	events: VecDeque<InputEvent>,
}

impl QueuedInput {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, event: InputEvent) {
		self.events.push_back(event);
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}
}

impl FromIterator<InputEvent> for QueuedInput {
	fn from_iter<I: IntoIterator<Item = InputEvent>>(iter: I) -> Self {
		Self {
			events: iter.into_iter().collect(),
		}
	}
}

impl InputPort for QueuedInput {
	fn next_event(&mut self) -> Option<InputEvent> {
		self.events.pop_front()
	}
}
