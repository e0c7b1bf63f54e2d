use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

/// Extension of template files. Templates compile to `.md`.
pub const TEMPLATE_EXTENSION: &str = "mdext";
/// Extension of fragments that are only ever inserted into templates.
pub const SOURCE_EXTENSION: &str = "mdsrc";
/// Extension of plain markdown, passed through and insertable.
pub const PLAIN_EXTENSION: &str = "md";

/// The role a document plays, decided once from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentKind {
	/// `.mdext`: compiled to `.md`.
	Template,
	/// `.mdsrc`: insertable only.
	Source,
	/// `.md`: passed through unchanged.
	Plain,
}

impl DocumentKind {
	/// Classify a file name by extension (ASCII case-insensitive). Returns
	/// `None` for anything mdext does not handle.
	pub fn classify(file_name: impl AsRef<Path>) -> Option<Self> {
		let ext = file_name.as_ref().extension()?.to_str()?;

		if ext.eq_ignore_ascii_case(TEMPLATE_EXTENSION) {
			Some(Self::Template)
		} else if ext.eq_ignore_ascii_case(SOURCE_EXTENSION) {
			Some(Self::Source)
		} else if ext.eq_ignore_ascii_case(PLAIN_EXTENSION) {
			Some(Self::Plain)
		} else {
			None
		}
	}
}

/// A markdown document tagged with its path relative to the collection root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
	file_name: String,
	file_path: PathBuf,
	content: String,
}

impl Document {
	/// Build a document from a root-relative path. The file name is taken
	/// from the last path component.
	pub fn new(file_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
		let file_path = file_path.into();
		let file_name = file_path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();

		Self {
			file_name,
			file_path,
			content: content.into(),
		}
	}

	pub fn file_name(&self) -> &str {
		&self.file_name
	}

	/// Path relative to the collection root, including the file name.
	pub fn file_path(&self) -> &Path {
		&self.file_path
	}

	pub fn content(&self) -> &str {
		&self.content
	}

	pub fn kind(&self) -> Option<DocumentKind> {
		DocumentKind::classify(&self.file_name)
	}

	pub fn is_template(&self) -> bool {
		self.kind() == Some(DocumentKind::Template)
	}

	/// A copy of this document with the extension rewritten to `.md` and the
	/// given content.
	pub fn to_markdown(&self, content: impl Into<String>) -> Self {
		Self::new(self.file_path.with_extension(PLAIN_EXTENSION), content)
	}
}
