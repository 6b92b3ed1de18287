#![forbid(unsafe_code)]

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::input::{Key, Modifiers};

pub const DEFAULT_TOGGLE_SHORTCUT: &str = "ctrl+alt+p";
pub const DEFAULT_CLEAR_SHORTCUT: &str = "ctrl+alt+x";
pub const DEFAULT_RESIZE_STEP: f32 = 16.0;
pub const DEFAULT_RESIZE_LARGE_STEP: f32 = 64.0;

// Bound by browsers to ctrl/cmd + letter (new tab, close, print, find, history, ...).
const RESERVED_PRIMARY: &[char] = &[
	'a', 'c', 'd', 'f', 'g', 'h', 'j', 'k', 'l', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const RESERVED_PRIMARY_SHIFT: &[char] = &['b', 'c', 'i', 'j', 'm', 'n', 'p', 'q', 'r', 't', 'w', 'z'];
// Menu and address bar accelerators.
const RESERVED_ALT: &[char] = &['d', 'e', 'f'];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
	#[error("empty shortcut")]
	Empty,
	#[error("unknown modifier: {0}")]
	UnknownModifier(String),
	#[error("shortcut key must be a single ASCII letter: {0}")]
	InvalidKey(String),
	#[error("shortcut needs ctrl, alt or meta: {0}")]
	MissingModifier(String),
}

/// A modifier + letter combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
	pub ctrl: bool,
	pub alt: bool,
	pub shift: bool,
	pub meta: bool,
	pub key: char,
}

impl Shortcut {
	pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
		let s = s.trim();
		if s.is_empty() {
			return Err(ShortcutParseError::Empty);
		}

		let parts: Vec<&str> = s.split('+').map(str::trim).collect();
		let (key_s, mods) = parts.split_last().ok_or(ShortcutParseError::Empty)?;

		let mut out = Shortcut {
			ctrl: false,
			alt: false,
			shift: false,
			meta: false,
			key: 'a',
		};
		for m in mods {
			match m.to_ascii_lowercase().as_str() {
				"ctrl" | "control" => out.ctrl = true,
				"alt" | "option" => out.alt = true,
				"shift" => out.shift = true,
				"meta" | "cmd" | "super" | "logo" => out.meta = true,
				other => return Err(ShortcutParseError::UnknownModifier(other.to_string())),
			}
		}

		let mut chars = key_s.chars();
		out.key = match (chars.next(), chars.next()) {
			(Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_lowercase(),
			_ => return Err(ShortcutParseError::InvalidKey(key_s.to_string())),
		};

		if !(out.ctrl || out.alt || out.meta) {
			return Err(ShortcutParseError::MissingModifier(s.to_string()));
		}
		Ok(out)
	}

	pub fn is_browser_reserved(&self) -> bool {
		let primary = self.ctrl || self.meta;
		if primary && !self.alt {
			let table = if self.shift { RESERVED_PRIMARY_SHIFT } else { RESERVED_PRIMARY };
			return table.contains(&self.key);
		}
		if self.alt && !primary {
			return RESERVED_ALT.contains(&self.key);
		}
		false
	}

	pub fn matches(&self, key: Key, modifiers: Modifiers) -> bool {
		let Key::Char(c) = key else {
			return false;
		};
		c.to_ascii_lowercase() == self.key
			&& modifiers.ctrl == self.ctrl
			&& modifiers.alt == self.alt
			&& modifiers.shift == self.shift
			&& modifiers.meta == self.meta
	}
}

impl fmt::Display for Shortcut {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.ctrl {
			f.write_str("ctrl+")?;
		}
		if self.alt {
			f.write_str("alt+")?;
		}
		if self.shift {
			f.write_str("shift+")?;
		}
		if self.meta {
			f.write_str("meta+")?;
		}
		write!(f, "{}", self.key)
	}
}

impl FromStr for Shortcut {
	type Err = ShortcutParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Shortcut::parse(s)
	}
}

/// Keyboard settings as written in the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybinds {
	pub toggle_split_view: String,
	pub clear_panels: String,
	pub resize_step: f32,
	pub resize_large_step: f32,
}

impl Default for Keybinds {
	fn default() -> Self {
		Self {
			toggle_split_view: DEFAULT_TOGGLE_SHORTCUT.to_string(),
			clear_panels: DEFAULT_CLEAR_SHORTCUT.to_string(),
			resize_step: DEFAULT_RESIZE_STEP,
			resize_large_step: DEFAULT_RESIZE_LARGE_STEP,
		}
	}
}

/// Validated keybinds the controller works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedKeybinds {
	pub toggle_split_view: Shortcut,
	pub clear_panels: Shortcut,
	pub resize_step: f32,
	pub resize_large_step: f32,
}

fn resolve_shortcut(name: &str, raw: &str, fallback: &str) -> Shortcut {
	let default = || Shortcut::parse(fallback).unwrap_or(Shortcut {
		ctrl: true,
		alt: true,
		shift: false,
		meta: false,
		key: 'p',
	});
	match Shortcut::parse(raw) {
		Ok(s) if s.is_browser_reserved() => {
			warn!(binding = name, shortcut = %s, "shortcut collides with a browser shortcut; using default");
			default()
		}
		Ok(s) => s,
		Err(e) => {
			warn!(binding = name, error = %e, "invalid shortcut; using default");
			default()
		}
	}
}

fn usable_step(v: f32, fallback: f32) -> f32 {
	if v.is_finite() && v > 0.0 { v } else { fallback }
}

impl Keybinds {
	pub fn resolve(&self) -> ResolvedKeybinds {
		let toggle = resolve_shortcut("toggle_split_view", &self.toggle_split_view, DEFAULT_TOGGLE_SHORTCUT);
		let clear = resolve_shortcut("clear_panels", &self.clear_panels, DEFAULT_CLEAR_SHORTCUT);
		if clear == toggle {
			warn!(shortcut = %clear, "clear_panels shares the toggle shortcut; using defaults for both");
			return Keybinds::default().resolve();
		}
		let step = usable_step(self.resize_step, DEFAULT_RESIZE_STEP);
		ResolvedKeybinds {
			toggle_split_view: toggle,
			clear_panels: clear,
			resize_step: step,
			resize_large_step: usable_step(self.resize_large_step, DEFAULT_RESIZE_LARGE_STEP).max(step),
		}
	}
}

impl Default for ResolvedKeybinds {
	fn default() -> Self {
		Keybinds::default().resolve()
	}
}
