//! Syntactic discovery of insert directives.
//!
//! The only supported shape is
//!
//! ```text
//! <MarkDownExtension operation="insert" file="PATH" />
//! ```
//!
//! matched case-insensitively with a fixed attribute order, on a single line
//! with spaces or tabs between attributes. Anything else that opens with
//! `<MarkDownExtension` is reported as malformed by the validator.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Strict grammar. Capture group 1 is the `file` attribute. A directive never
/// spans lines, matching the line-by-line validator.
static DIRECTIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	match Regex::new(concat!(
		r"(?i)<MarkDownExtension",
		r#"[ \t]+operation[ \t]*=[ \t]*"insert""#,
		r#"[ \t]+file[ \t]*=[ \t]*"([^"\r\n]*)""#,
		r"[ \t]*/>",
	)) {
		Ok(regex) => regex,
		Err(err) => panic!("Invalid directive regex: {err}"),
	}
});

/// The strict grammar anchored to a whole tag.
static DIRECTIVE_EXACT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	match Regex::new(&format!("^(?:{})$", DIRECTIVE_PATTERN.as_str())) {
		Ok(regex) => regex,
		Err(err) => panic!("Invalid anchored directive regex: {err}"),
	}
});

/// Loose discovery: any tag opening with `<MarkDownExtension`, up to the first
/// unquoted `>` or the end of the line when the tag is never closed.
static DIRECTIVE_LIKE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	match Regex::new(r#"(?im)<MarkDownExtension\b(?:"[^"\n]*"|[^">\n]|")*(?:>|$)"#) {
		Ok(regex) => regex,
		Err(err) => panic!("Invalid directive-like regex: {err}"),
	}
});

static OPERATION_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
	match Regex::new(r"(?i)\boperation\s*=") {
		Ok(regex) => regex,
		Err(err) => panic!("Invalid operation regex: {err}"),
	}
});

static INSERT_OPERATION: LazyLock<Regex> = LazyLock::new(|| {
	match Regex::new(r#"(?i)\boperation\s*=\s*"insert""#) {
		Ok(regex) => regex,
		Err(err) => panic!("Invalid insert operation regex: {err}"),
	}
});

static FILE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
	match Regex::new(r"(?i)\bfile\s*=") {
		Ok(regex) => regex,
		Err(err) => panic!("Invalid file regex: {err}"),
	}
});

/// A strictly valid directive found in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
	/// The whole tag as written.
	pub full_match: &'a str,
	/// The raw `file` attribute value, which may be empty.
	pub file_path: &'a str,
	/// Byte offset of the tag in the scanned text.
	pub offset: usize,
}

/// Every strictly valid directive in `text`, in order of appearance.
pub fn find_valid_directives(text: &str) -> Vec<Directive<'_>> {
	DIRECTIVE_PATTERN
		.captures_iter(text)
		.filter_map(|caps| {
			let full = caps.get(0)?;
			let file = caps.get(1)?;
			Some(Directive {
				full_match: full.as_str(),
				file_path: file.as_str(),
				offset: full.start(),
			})
		})
		.collect()
}

/// Whether `text` contains at least one valid directive.
pub fn has_directives(text: &str) -> bool {
	DIRECTIVE_PATTERN.is_match(text)
}

/// Every tag that looks like a directive, valid or not.
pub fn find_directive_like_tags(text: &str) -> Vec<&str> {
	DIRECTIVE_LIKE_PATTERN
		.find_iter(text)
		.map(|m| m.as_str())
		.collect()
}

/// Whether `tag` is exactly one strictly valid directive.
pub fn is_valid_directive(tag: &str) -> bool {
	DIRECTIVE_EXACT_PATTERN.is_match(tag)
}

/// Why a directive-like tag failed the strict grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedDirective {
	MissingOperation,
	InvalidOperation,
	MissingFile,
	Malformed,
}

impl fmt::Display for MalformedDirective {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingOperation => f.write_str("missing required 'operation' attribute"),
			Self::InvalidOperation => {
				f.write_str(r#"'operation' must be "insert", the only supported operation"#)
			}
			Self::MissingFile => f.write_str("missing required 'file' attribute"),
			Self::Malformed => {
				f.write_str(
					r#"expected <MarkDownExtension operation="insert" file="..." /> with attributes in this order"#,
				)
			}
		}
	}
}

/// Pick the most specific reason a tag is malformed. The checks run in a fixed
/// priority: operation presence, operation value, file presence, then the
/// generic fallback.
pub fn classify_malformed(tag: &str) -> MalformedDirective {
	if !OPERATION_ATTRIBUTE.is_match(tag) {
		MalformedDirective::MissingOperation
	} else if !INSERT_OPERATION.is_match(tag) {
		MalformedDirective::InvalidOperation
	} else if !FILE_ATTRIBUTE.is_match(tag) {
		MalformedDirective::MissingFile
	} else {
		MalformedDirective::Malformed
	}
}
