use std::collections::HashMap;

use crate::MdextError;
use crate::MdextResult;
use crate::config::DEFAULT_MAX_OUTPUT_SIZE;
use crate::config::MdextConfig;
use crate::directive::find_valid_directives;
use crate::directive::has_directives;
use crate::document::Document;
use crate::document::DocumentKind;
use crate::sources::SourceIndex;

/// Number of substitution passes before compilation gives up on nested
/// directives.
pub const MAX_ITERATIONS: usize = 10;

/// Options that bound a single compilation.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
	/// Compiled text larger than this is rejected and the template is passed
	/// through unprocessed.
	pub max_output_size: u64,
}

impl Default for CompileOptions {
	fn default() -> Self {
		Self {
			max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
		}
	}
}

impl CompileOptions {
	pub fn from_config(config: Option<&MdextConfig>) -> Self {
		Self {
			max_output_size: config.map_or(DEFAULT_MAX_OUTPUT_SIZE, |c| c.max_output_size),
		}
	}
}

/// Placeholder left in place of a directive whose source cannot be found.
pub fn missing_source_placeholder(key: &str) -> String {
	format!("<!-- Missing source: {key} -->")
}

/// Compile a template with the default [`CompileOptions`].
pub fn compile(template: &Document, sources: &SourceIndex) -> Document {
	compile_with_options(template, sources, &CompileOptions::default())
}

/// Compile a template into a `.md` document.
///
/// This never fails. Unresolved directives become placeholders, directives
/// still present after [`MAX_ITERATIONS`] passes are left verbatim, and any
/// internal failure falls back to the original content.
pub fn compile_with_options(
	template: &Document,
	sources: &SourceIndex,
	options: &CompileOptions,
) -> Document {
	match compile_text(template, sources, options) {
		Ok(content) => template.to_markdown(content),
		Err(e) => {
			tracing::error!(
				file = %template.file_path().display(),
				error = %e,
				"compilation failed, emitting the template unprocessed"
			);
			template.to_markdown(template.content())
		}
	}
}

fn compile_text(
	template: &Document,
	sources: &SourceIndex,
	options: &CompileOptions,
) -> MdextResult<String> {
	let mut text = template.content().to_string();

	for pass in 0..MAX_ITERATIONS {
		let Some(next) = substitute_pass(template, &text, sources) else {
			tracing::debug!(
				file = %template.file_path().display(),
				passes = pass,
				"template compiled"
			);
			return Ok(text);
		};

		if next.len() as u64 > options.max_output_size {
			return Err(MdextError::OutputTooLarge {
				file: template.file_path().display().to_string(),
				limit: options.max_output_size,
			});
		}

		text = next;
	}

	if has_directives(&text) {
		tracing::warn!(
			file = %template.file_path().display(),
			max_iterations = MAX_ITERATIONS,
			"reached the maximum number of passes, the template may contain a circular reference"
		);
	}

	Ok(text)
}

/// Replace every directive in `text` once. Returns `None` when there is
/// nothing left to replace.
fn substitute_pass(template: &Document, text: &str, sources: &SourceIndex) -> Option<String> {
	let directives = find_valid_directives(text);
	if directives.is_empty() {
		return None;
	}

	// Resolved once per distinct directive string so identical occurrences
	// receive identical content.
	let mut resolved: HashMap<&str, String> = HashMap::new();
	for directive in &directives {
		resolved.entry(directive.full_match).or_insert_with(|| {
			let key = sources.resolve(template.file_path(), directive.file_path);
			match sources.get(&key) {
				Some(content) => content.to_string(),
				None => missing_source_placeholder(key.as_str()),
			}
		});
	}

	let mut next = String::with_capacity(text.len());
	let mut cursor = 0;
	for directive in &directives {
		next.push_str(&text[cursor..directive.offset]);
		next.push_str(&resolved[directive.full_match]);
		cursor = directive.offset + directive.full_match.len();
	}
	next.push_str(&text[cursor..]);

	Some(next)
}

/// Compile every template and pass plain markdown through unchanged. Source
/// fragments do not produce output.
pub fn compile_documents(
	documents: &[Document],
	sources: &SourceIndex,
	options: &CompileOptions,
) -> Vec<Document> {
	documents
		.iter()
		.filter_map(|doc| {
			match doc.kind()? {
				DocumentKind::Template => Some(compile_with_options(doc, sources, options)),
				DocumentKind::Plain => Some(doc.clone()),
				DocumentKind::Source => None,
			}
		})
		.collect()
}
