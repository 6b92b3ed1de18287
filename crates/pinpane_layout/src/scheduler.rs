#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub trait Clock: Send + Sync {
	fn now(&self) -> Instant;
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
	now: Arc<Mutex<Instant>>,
}

impl ManualClock {
	pub fn new() -> Self {
		Self {
			now: Arc::new(Mutex::new(Instant::now())),
		}
	}

	pub fn advance(&self, by: Duration) {
		*self.now.lock() += by;
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Instant {
		*self.now.lock()
	}
}

/// Coalesces write requests.
///
/// Holds no data: whoever flushes serializes the state current at flush time, so a late
/// write can never replace a newer state with an older one.
#[derive(Debug, Clone)]
pub struct WriteScheduler {
	debounce: Duration,
	max_delay: Duration,
	first_request: Option<Instant>,
	deadline: Option<Instant>,
}

impl WriteScheduler {
	pub fn new(debounce: Duration, max_delay: Duration) -> Self {
		Self {
			debounce,
			max_delay: max_delay.max(debounce),
			first_request: None,
			deadline: None,
		}
	}

	/// Request a write `debounce` from now. Repeated requests push the deadline back,
	/// but never past `max_delay` after the first pending request.
	pub fn schedule(&mut self, now: Instant) {
		let first = *self.first_request.get_or_insert(now);
		let trailing = now + self.debounce;
		let cap = first + self.max_delay;
		self.deadline = Some(trailing.min(cap));
	}

	/// Request a write on the next flush check regardless of the debounce.
	pub fn commit_now(&mut self, now: Instant) {
		self.first_request.get_or_insert(now);
		self.deadline = Some(now);
	}

	pub fn is_pending(&self) -> bool {
		self.deadline.is_some()
	}

	pub fn due(&self, now: Instant) -> bool {
		self.deadline.is_some_and(|d| now >= d)
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn mark_flushed(&mut self) {
		self.first_request = None;
		self.deadline = None;
	}

	/// Keep the write pending; it is retried after another debounce interval.
	pub fn mark_failed(&mut self, now: Instant) {
		self.first_request = Some(now);
		self.deadline = Some(now + self.debounce);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MS: Duration = Duration::from_millis(1);

	#[test]
	fn debounce_pushes_deadline_back() {
		let t0 = Instant::now();
		let mut s = WriteScheduler::new(100 * MS, 1000 * MS);
		s.schedule(t0);
		s.schedule(t0 + 50 * MS);
		assert!(!s.due(t0 + 120 * MS));
		assert!(s.due(t0 + 150 * MS));
	}

	#[test]
	fn max_delay_bounds_a_stream_of_requests() {
		let t0 = Instant::now();
		let mut s = WriteScheduler::new(100 * MS, 300 * MS);
		for i in 0..10u32 {
			s.schedule(t0 + i * 50 * MS);
		}
		assert_eq!(s.deadline(), Some(t0 + 300 * MS));
	}

	#[test]
	fn commit_now_is_due_immediately() {
		let t0 = Instant::now();
		let mut s = WriteScheduler::new(100 * MS, 300 * MS);
		s.schedule(t0);
		s.commit_now(t0);
		assert!(s.due(t0));
		s.mark_flushed();
		assert!(!s.is_pending());
	}

	#[test]
	fn failed_write_stays_pending() {
		let t0 = Instant::now();
		let mut s = WriteScheduler::new(100 * MS, 300 * MS);
		s.commit_now(t0);
		s.mark_failed(t0);
		assert!(s.is_pending());
		assert!(!s.due(t0 + 50 * MS));
		assert!(s.due(t0 + 100 * MS));
	}

	#[test]
	fn manual_clock_clones_share_time() {
		let c = ManualClock::new();
		let d = c.clone();
		let t0 = c.now();
		d.advance(5 * MS);
		assert_eq!(c.now(), t0 + 5 * MS);
	}
}
