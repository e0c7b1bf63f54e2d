use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// Reduce any file reference to its final path segment.
///
/// Both `/` and `\` are treated as separators regardless of the host so that
/// directives written on one platform resolve the same way on another.
/// Blank input and paths ending in a separator produce an empty string.
pub fn normalize_key(path: &str) -> String {
	if path.trim().is_empty() {
		return String::new();
	}

	path.rsplit(['/', '\\']).next().unwrap_or_default().to_string()
}

/// Lexically normalize a relative path: unify separators to `/`, drop `.`
/// segments and fold `..` into its parent. A `..` that climbs above the root
/// is kept so the result can never alias a path inside the root.
pub fn normalize_relative_path(path: &str) -> String {
	let mut segments: Vec<&str> = Vec::new();

	for segment in path.split(['/', '\\']) {
		match segment {
			"" | "." => {}
			".." => {
				if segments.last().is_some_and(|last| *last != "..") {
					segments.pop();
				} else {
					segments.push(segment);
				}
			}
			_ => segments.push(segment),
		}
	}

	segments.join("/")
}

/// How a directive's `file` attribute becomes a lookup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
	/// Only the file name is significant. Files with the same name in
	/// different directories alias each other.
	#[default]
	FileName,
	/// The full path relative to the collection root is significant.
	RelativePath,
}

impl ResolutionMode {
	/// Key for a file reference written inside the template at
	/// `template_path`.
	pub fn resolve(self, template_path: &Path, file: &str) -> ResolutionKey {
		let base = template_path
			.parent()
			.map(|dir| dir.to_string_lossy().into_owned())
			.unwrap_or_default();
		let joined = if base.is_empty() {
			file.to_string()
		} else {
			format!("{base}/{file}")
		};

		self.key_for(&joined)
	}

	/// Key for a document stored at `relative_path`.
	pub fn key_for(self, relative_path: &str) -> ResolutionKey {
		match self {
			Self::FileName => ResolutionKey::new(normalize_key(relative_path)),
			Self::RelativePath => ResolutionKey::new(normalize_relative_path(relative_path)),
		}
	}
}

/// A case-insensitive lookup key.
///
/// The original spelling is kept for messages, while equality and hashing use
/// a copy folded with [`str::to_lowercase`], which does not depend on the
/// current locale. It is not a full Unicode case fold: `ß` and `SS` stay
/// distinct, while the Kelvin sign (`\u{212A}`) matches a plain `k`.
#[derive(Debug, Clone)]
pub struct ResolutionKey {
	display: String,
	folded: String,
}

impl ResolutionKey {
	pub fn new(key: impl Into<String>) -> Self {
		let display = key.into();
		let folded = display.to_lowercase();
		Self { display, folded }
	}

	pub fn as_str(&self) -> &str {
		&self.display
	}

	pub fn is_empty(&self) -> bool {
		self.display.is_empty()
	}
}

impl PartialEq for ResolutionKey {
	fn eq(&self, other: &Self) -> bool {
		self.folded == other.folded
	}
}

impl Eq for ResolutionKey {}

impl Hash for ResolutionKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.folded.hash(state);
	}
}

impl fmt::Display for ResolutionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.display)
	}
}

impl From<&str> for ResolutionKey {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for ResolutionKey {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
