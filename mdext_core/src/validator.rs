use std::collections::HashMap;
use std::collections::HashSet;

use serde::Serialize;

use crate::directive::classify_malformed;
use crate::directive::find_directive_like_tags;
use crate::directive::find_valid_directives;
use crate::directive::is_valid_directive;
use crate::document::Document;
use crate::key::ResolutionKey;
use crate::sources::SourceIndex;

/// The line an issue was found on, with the trimmed text of that line so it
/// can be shown without reading the file again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueLocation {
	/// 1-indexed line number.
	pub line_number: usize,
	pub source_context: String,
}

/// A single error or warning produced by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
	/// Human-readable message, prefixed with the template's file name.
	pub message: String,
	/// The directive's `file` attribute, when the issue concerns one.
	pub directive_path: Option<String>,
	/// Relative path of the template the issue belongs to.
	pub source_file: Option<String>,
	#[serde(flatten)]
	pub location: Option<IssueLocation>,
}

impl ValidationIssue {
	pub fn line_number(&self) -> Option<usize> {
		self.location.as_ref().map(|loc| loc.line_number)
	}

	pub fn source_context(&self) -> Option<&str> {
		self.location.as_ref().map(|loc| loc.source_context.as_str())
	}
}

/// Outcome of validating a set of templates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
	/// Templates that produced no errors. Warnings do not count against a
	/// template.
	pub valid_files_count: usize,
	pub errors: Vec<ValidationIssue>,
	pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
	/// Returns true when no errors were found.
	pub fn is_valid(&self) -> bool {
		self.errors.is_empty()
	}

	/// Number of distinct templates with at least one error.
	pub fn invalid_files_count(&self) -> usize {
		distinct_files(&self.errors)
	}

	/// Number of distinct templates with at least one warning.
	pub fn warning_files_count(&self) -> usize {
		distinct_files(&self.warnings)
	}

	pub fn has_warnings(&self) -> bool {
		!self.warnings.is_empty()
	}
}

fn distinct_files(issues: &[ValidationIssue]) -> usize {
	issues
		.iter()
		.filter_map(|issue| issue.source_file.as_deref())
		.collect::<HashSet<_>>()
		.len()
}

/// Validate every template against the available sources.
///
/// Malformed directives, empty or invalid file references and missing sources
/// are errors. Duplicate directives, circular references and ambiguous source
/// keys are warnings. Content problems never make this function fail.
pub fn validate(templates: &[Document], sources: &SourceIndex) -> ValidationResult {
	let mut result = ValidationResult::default();

	for template in templates {
		let mut checker = TemplateChecker::new(template);
		checker.check_lines(sources);
		checker.check_cycles(sources);

		if checker.errors.is_empty() {
			result.valid_files_count += 1;
		}
		result.errors.append(&mut checker.errors);
		result.warnings.append(&mut checker.warnings);
	}

	result
}

/// Characters rejected in a directive's `file` value. Separators are allowed
/// because the value may be a relative path.
fn is_invalid_path_char(c: char) -> bool {
	c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*')
}

/// State of one depth-first search over a template's includes.
#[derive(Default)]
struct CycleSearch {
	/// Keys on the branch currently being followed, outermost first.
	path: Vec<ResolutionKey>,
	/// Keys whose includes have been searched completely.
	finished: HashSet<ResolutionKey>,
	/// Keys already reported as part of a cycle.
	reported: HashSet<ResolutionKey>,
	cycles: Vec<Vec<ResolutionKey>>,
}

struct TemplateChecker<'a> {
	template: &'a Document,
	source_file: String,
	/// Keys referenced directly by the template that resolve to a source, in
	/// order of first appearance.
	referenced: Vec<ResolutionKey>,
	errors: Vec<ValidationIssue>,
	warnings: Vec<ValidationIssue>,
}

impl<'a> TemplateChecker<'a> {
	fn new(template: &'a Document) -> Self {
		Self {
			template,
			source_file: template.file_path().display().to_string(),
			referenced: Vec::new(),
			errors: Vec::new(),
			warnings: Vec::new(),
		}
	}

	fn issue(
		&self,
		message: impl AsRef<str>,
		directive_path: Option<&str>,
		location: Option<(usize, &str)>,
	) -> ValidationIssue {
		ValidationIssue {
			message: format!("{}: {}", self.template.file_name(), message.as_ref()),
			directive_path: directive_path.map(ToString::to_string),
			source_file: Some(self.source_file.clone()),
			location: location.map(|(line_number, line)| {
				IssueLocation {
					line_number,
					source_context: line.trim().to_string(),
				}
			}),
		}
	}

	fn check_lines(&mut self, sources: &SourceIndex) {
		let template = self.template;
		let mut first_seen: HashMap<&str, usize> = HashMap::new();

		for (index, line) in template.content().lines().enumerate() {
			let line_number = index + 1;
			let at = Some((line_number, line));

			for tag in find_directive_like_tags(line) {
				if !is_valid_directive(tag) {
					let reason = classify_malformed(tag);
					let issue = self.issue(format!("Malformed directive, {reason}"), None, at);
					self.errors.push(issue);
				}
			}

			for directive in find_valid_directives(line) {
				let file = directive.file_path;

				if let Some(first_line) = first_seen.get(directive.full_match) {
					let issue = self.issue(
						format!(
							"Duplicate directive `{}`, first used on line {first_line}",
							directive.full_match
						),
						Some(file),
						at,
					);
					self.warnings.push(issue);
					continue;
				}
				first_seen.insert(directive.full_match, line_number);

				if file.trim().is_empty() {
					let issue = self.issue("Directive has an empty 'file' attribute", Some(file), at);
					self.errors.push(issue);
					continue;
				}

				if let Some(c) = file.chars().find(|c| is_invalid_path_char(*c)) {
					let issue = self.issue(
						format!(
							"Directive file path `{}` contains the invalid character {c:?}",
							file.escape_debug()
						),
						Some(file),
						at,
					);
					self.errors.push(issue);
					continue;
				}

				let key = sources.resolve(template.file_path(), file);
				if !sources.contains(&key) {
					let issue =
						self.issue(format!("Source file not found: `{key}`"), Some(file), at);
					self.errors.push(issue);
					continue;
				}

				if let Some(collision) = sources.collision(&key) {
					let files = collision
						.files
						.iter()
						.map(|path| path.display().to_string())
						.collect::<Vec<_>>()
						.join(", ");
					let used = collision
						.used()
						.map(|path| path.display().to_string())
						.unwrap_or_default();
					let issue = self.issue(
						format!("Source key `{key}` is ambiguous ({files}), `{used}` is used"),
						Some(file),
						at,
					);
					self.warnings.push(issue);
				}

				if !self.referenced.contains(&key) {
					self.referenced.push(key);
				}
			}
		}
	}

	/// Follow every directly referenced source through its own directives and
	/// warn when a key shows up again on the path that led to it.
	fn check_cycles(&mut self, sources: &SourceIndex) {
		let mut search = CycleSearch::default();

		for root in &self.referenced {
			self.walk(root, sources, &mut search);
		}

		for cycle in search.cycles {
			let Some(key) = cycle.last() else {
				continue;
			};
			let chain = cycle
				.iter()
				.map(ResolutionKey::as_str)
				.collect::<Vec<_>>()
				.join(" -> ");
			let issue = self.issue(
				format!("Potential circular reference to `{key}` ({chain})"),
				Some(key.as_str()),
				None,
			);
			self.warnings.push(issue);
		}
	}

	fn walk(&self, key: &ResolutionKey, sources: &SourceIndex, search: &mut CycleSearch) {
		if let Some(start) = search.path.iter().position(|seen| seen == key) {
			if search.reported.insert(key.clone()) {
				let mut cycle = search.path[start..].to_vec();
				cycle.push(key.clone());
				search.cycles.push(cycle);
			}
			return;
		}

		// Everything reachable from a finished key has been searched already.
		if search.finished.contains(key) {
			return;
		}

		let Some(content) = sources.get(key) else {
			search.finished.insert(key.clone());
			return;
		};

		let mut children: Vec<ResolutionKey> = Vec::new();
		for directive in find_valid_directives(content) {
			let child = sources.resolve(self.template.file_path(), directive.file_path);
			if !children.contains(&child) {
				children.push(child);
			}
		}

		// The path only ever holds the current branch, so siblings never see
		// each other's keys.
		search.path.push(key.clone());
		for child in &children {
			self.walk(child, sources, search);
		}
		search.path.pop();
		search.finished.insert(key.clone());
	}
}
