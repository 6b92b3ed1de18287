#![forbid(unsafe_code)]

//! Decides whether pinned panels are shown at all for the current container width.
//!
//! This is a visibility gate only: panels below the breakpoint stay pinned in the store and
//! reappear once the container grows again.
//!
//! Width observations are debounced. An observation becomes the settled width once no
//! newer observation arrived for `settle`, so the gate converges one settle interval after
//! resizing stops. The first observation is applied immediately.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::store::{LayoutSnapshot, LayoutStore};

pub const DEFAULT_BREAKPOINT: f32 = 1024.0;
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationSource {
	/// Size observation of the layout container.
	ContainerObserver,
	/// Window resize events, used when container observation is not available.
	WindowResize,
	Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
	ContainerResized(f32),
	WindowResized(f32),
	ContainerObserverLost,
	ObservationUnavailable,
}

pub trait ViewportPort {
	fn next_viewport_event(&mut self) -> Option<ViewportEvent>;
}

impl ViewportPort for VecDeque<ViewportEvent> {
	fn next_viewport_event(&mut self) -> Option<ViewportEvent> {
		self.pop_front()
	}
}

#[derive(Debug, Clone)]
pub struct ResponsiveCoordinator {
	breakpoint: f32,
	settle: Duration,
	source: ObservationSource,
	width: Option<f32>,
	pending: Option<(f32, Instant)>,
}

impl Default for ResponsiveCoordinator {
	fn default() -> Self {
		Self::new(DEFAULT_BREAKPOINT, DEFAULT_SETTLE)
	}
}

impl ResponsiveCoordinator {
	pub fn new(breakpoint: f32, settle: Duration) -> Self {
		Self {
			breakpoint,
			settle,
			source: ObservationSource::Unavailable,
			width: None,
			pending: None,
		}
	}

	pub fn breakpoint(&self) -> f32 {
		self.breakpoint
	}

	pub fn source(&self) -> ObservationSource {
		self.source
	}

	/// Settled width, if any observation arrived.
	pub fn width(&self) -> Option<f32> {
		self.width
	}

	/// Without any width the viewport is treated as below the breakpoint.
	pub fn is_desktop_eligible(&self) -> bool {
		self.width.is_some_and(|w| w >= self.breakpoint)
	}

	pub fn should_render(&self, snapshot: &LayoutSnapshot) -> bool {
		self.is_desktop_eligible() && snapshot.config.enabled && !snapshot.panels.is_empty()
	}

	pub fn observe_container(&mut self, width: f32, now: Instant) {
		if self.source != ObservationSource::ContainerObserver {
			debug!("viewport: using container observation");
			self.source = ObservationSource::ContainerObserver;
		}
		self.record(width, now);
	}

	/// Ignored while container observation is active.
	pub fn observe_window(&mut self, width: f32, now: Instant) {
		if self.source == ObservationSource::ContainerObserver {
			return;
		}
		self.source = ObservationSource::WindowResize;
		self.record(width, now);
	}

	pub fn container_observer_lost(&mut self) {
		if self.source == ObservationSource::ContainerObserver {
			info!("viewport: container observation lost; falling back to window resize events");
			self.source = ObservationSource::WindowResize;
		}
	}

	pub fn observation_unavailable(&mut self) {
		info!("viewport: no size observation available; hiding split view");
		self.source = ObservationSource::Unavailable;
		self.width = None;
		self.pending = None;
	}

	fn record(&mut self, width: f32, now: Instant) {
		if !width.is_finite() || width < 0.0 {
			debug!(width, "viewport: ignoring unusable width");
			return;
		}
		if self.width.is_none() {
			self.width = Some(width);
			self.pending = None;
			return;
		}
		self.pending = Some((width, now));
	}

	/// Apply a settled observation. Returns true when eligibility flipped.
	pub fn tick(&mut self, now: Instant) -> bool {
		let Some((width, at)) = self.pending else {
			return false;
		};
		if now.saturating_duration_since(at) < self.settle {
			return false;
		}
		let before = self.is_desktop_eligible();
		self.width = Some(width);
		self.pending = None;
		let after = self.is_desktop_eligible();
		if before != after {
			info!(width, eligible = after, breakpoint = self.breakpoint, "viewport: split view eligibility changed");
		}
		before != after
	}

	/// Feed queued viewport events, settle, and hand the container width to the store.
	pub fn drain(&mut self, port: &mut dyn ViewportPort, store: &mut LayoutStore, now: Instant) -> bool {
		let before = self.is_desktop_eligible();
		while let Some(event) = port.next_viewport_event() {
			match event {
				ViewportEvent::ContainerResized(w) => self.observe_container(w, now),
				ViewportEvent::WindowResized(w) => self.observe_window(w, now),
				ViewportEvent::ContainerObserverLost => self.container_observer_lost(),
				ViewportEvent::ObservationUnavailable => self.observation_unavailable(),
			}
		}
		self.tick(now);
		store.set_container_width(self.width);
		before != self.is_desktop_eligible()
	}
}
