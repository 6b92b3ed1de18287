#![forbid(unsafe_code)]

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of conversation a panel shows. Decides which renderer owns the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
	Channel,
	Dm,
	Thread,
}

impl PanelKind {
	pub const ALL: [PanelKind; 3] = [PanelKind::Channel, PanelKind::Dm, PanelKind::Thread];

	/// Stable string identifier.
	pub const fn as_str(self) -> &'static str {
		match self {
			PanelKind::Channel => "channel",
			PanelKind::Dm => "dm",
			PanelKind::Thread => "thread",
		}
	}

	/// Channels and threads live inside a server; direct messages do not.
	pub const fn requires_server(self) -> bool {
		matches!(self, PanelKind::Channel | PanelKind::Thread)
	}
}

impl fmt::Display for PanelKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Errors for parsing identifiers from strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIdError {
	#[error("empty value")]
	Empty,
	#[error("unknown panel kind: {0}")]
	UnknownKind(String),
	#[error("invalid format: {0}")]
	InvalidFormat(String),
}

impl FromStr for PanelKind {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.is_empty() {
			return Err(ParseIdError::Empty);
		}

		match s.to_ascii_lowercase().as_str() {
			"channel" => Ok(PanelKind::Channel),
			"dm" | "direct" | "direct_message" => Ok(PanelKind::Dm),
			"thread" => Ok(PanelKind::Thread),
			other => Err(ParseIdError::UnknownKind(other.to_string())),
		}
	}
}

macro_rules! string_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			/// Create a non-empty id.
			pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
				let id = id.into();
				if id.trim().is_empty() {
					return Err(ParseIdError::Empty);
				}
				Ok(Self(id))
			}
			pub fn as_str(&self) -> &str {
				&self.0
			}
			pub fn into_string(self) -> String {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl FromStr for $name {
			type Err = ParseIdError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				$name::new(s.to_string())
			}
		}
	};
}

string_id!(
	/// Identifier of the underlying channel, DM or thread.
	TargetId
);

string_id!(
	/// Identifier of the server a channel or thread belongs to.
	ServerId
);

/// Uniqueness key of a pinned panel: `(kind, target_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelTarget {
	pub kind: PanelKind,
	pub target_id: TargetId,
}

impl PanelTarget {
	pub fn new(kind: PanelKind, target_id: TargetId) -> Self {
		Self { kind, target_id }
	}

	/// Parse a `kind:target_id` string.
	pub fn parse(s: &str) -> Result<Self, ParseIdError> {
		let s = s.trim();
		if s.is_empty() {
			return Err(ParseIdError::Empty);
		}

		let (kind_s, target_s) = s
			.split_once(':')
			.ok_or_else(|| ParseIdError::InvalidFormat("expected kind:target_id".into()))?;

		let kind = PanelKind::from_str(kind_s)?;
		let target_id = TargetId::new(target_s.to_string())?;
		Ok(Self::new(kind, target_id))
	}
}

impl fmt::Display for PanelTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.kind, self.target_id)
	}
}

impl FromStr for PanelTarget {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		PanelTarget::parse(s)
	}
}

/// Identifier minted when a panel is pinned. Never equal to the target id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(pub uuid::Uuid);

impl PanelId {
	pub fn new_v4() -> Self {
		Self(uuid::Uuid::new_v4())
	}
}

impl fmt::Display for PanelId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// What a content view hands over when the user pins it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDraft {
	pub kind: PanelKind,
	pub target_id: TargetId,
	pub title: String,
	pub server_id: Option<ServerId>,
	pub icon_url: Option<String>,
}

impl PanelDraft {
	pub fn new(kind: PanelKind, target_id: TargetId, title: impl Into<String>) -> Self {
		Self {
			kind,
			target_id,
			title: title.into(),
			server_id: None,
			icon_url: None,
		}
	}

	pub fn with_server(mut self, server_id: ServerId) -> Self {
		self.server_id = Some(server_id);
		self
	}

	pub fn with_icon(mut self, icon_url: impl Into<String>) -> Self {
		let url = icon_url.into();
		self.icon_url = if url.trim().is_empty() { None } else { Some(url) };
		self
	}

	pub fn target(&self) -> PanelTarget {
		PanelTarget::new(self.kind, self.target_id.clone())
	}
}

/// One pinned pane.
///
/// `title` and `icon_url` are captured at pin time and are not kept in sync with the
/// conversation afterwards. `width` survives collapsing so the pane can be restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelEntry {
	pub id: PanelId,
	#[serde(rename = "type")]
	pub kind: PanelKind,
	pub target_id: TargetId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub server_id: Option<ServerId>,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub icon_url: Option<String>,
	pub width: f32,
	#[serde(default)]
	pub collapsed: bool,
}

impl PanelEntry {
	pub fn from_draft(draft: PanelDraft, width: f32) -> Self {
		Self {
			id: PanelId::new_v4(),
			kind: draft.kind,
			target_id: draft.target_id,
			server_id: draft.server_id,
			title: draft.title,
			icon_url: draft.icon_url,
			width,
			collapsed: false,
		}
	}

	pub fn target(&self) -> PanelTarget {
		PanelTarget::new(self.kind, self.target_id.clone())
	}

	pub fn is_target(&self, target: &PanelTarget) -> bool {
		self.kind == target.kind && self.target_id == target.target_id
	}

	/// Width the pane occupies on screen.
	pub fn effective_width(&self, collapsed_width: f32) -> f32 {
		if self.collapsed { collapsed_width } else { self.width }
	}
}
