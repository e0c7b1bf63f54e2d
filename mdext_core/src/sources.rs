use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use crate::document::Document;
use crate::key::ResolutionKey;
use crate::key::ResolutionMode;

/// Several documents reduced to the same lookup key.
#[derive(Debug, Clone)]
pub struct KeyCollision {
	pub key: ResolutionKey,
	/// Every path sharing the key, in relative-path order.
	pub files: Vec<PathBuf>,
}

impl KeyCollision {
	/// The path whose content wins the lookup.
	pub fn used(&self) -> Option<&Path> {
		self.files.first().map(PathBuf::as_path)
	}
}

/// Insertable content keyed by [`ResolutionKey`]. Shared read-only by the
/// compiler and validator.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
	mode: ResolutionMode,
	entries: HashMap<ResolutionKey, String>,
	collisions: HashMap<ResolutionKey, KeyCollision>,
}

impl SourceIndex {
	/// An empty index using `mode` for lookups.
	pub fn new(mode: ResolutionMode) -> Self {
		Self {
			mode,
			entries: HashMap::new(),
			collisions: HashMap::new(),
		}
	}

	/// Index every document mdext handles. Every kind is insertable, templates
	/// contributing their raw text. Documents are taken in relative-path
	/// order, so when two of them share a key the first path wins regardless
	/// of collection order.
	pub fn from_documents<'a>(
		documents: impl IntoIterator<Item = &'a Document>,
		mode: ResolutionMode,
	) -> Self {
		let mut documents: Vec<&Document> = documents
			.into_iter()
			.filter(|doc| doc.kind().is_some())
			.collect();
		documents.sort_by(|a, b| a.file_path().cmp(b.file_path()));

		let mut index = Self::new(mode);
		let mut owners: HashMap<ResolutionKey, Vec<PathBuf>> = HashMap::new();

		for doc in documents {
			let key = mode.key_for(&doc.file_path().to_string_lossy());
			owners
				.entry(key.clone())
				.or_default()
				.push(doc.file_path().to_path_buf());
			index
				.entries
				.entry(key)
				.or_insert_with(|| doc.content().to_string());
		}

		for (key, files) in owners {
			if files.len() < 2 {
				continue;
			}

			tracing::warn!(
				key = %key,
				files = ?files,
				"several files share the same source key, using the first"
			);
			index
				.collisions
				.insert(key.clone(), KeyCollision { key, files });
		}

		index
	}

	/// Add a single entry. An existing entry for the key is replaced.
	pub fn insert(&mut self, key: impl Into<ResolutionKey>, content: impl Into<String>) {
		self.entries.insert(key.into(), content.into());
	}

	pub fn mode(&self) -> ResolutionMode {
		self.mode
	}

	/// Key for a directive `file` reference inside the template at
	/// `template_path`.
	pub fn resolve(&self, template_path: &Path, file: &str) -> ResolutionKey {
		self.mode.resolve(template_path, file)
	}

	pub fn get(&self, key: &ResolutionKey) -> Option<&str> {
		self.entries.get(key).map(String::as_str)
	}

	pub fn contains(&self, key: &ResolutionKey) -> bool {
		self.entries.contains_key(key)
	}

	pub fn collision(&self, key: &ResolutionKey) -> Option<&KeyCollision> {
		self.collisions.get(key)
	}

	pub fn collisions(&self) -> impl Iterator<Item = &KeyCollision> {
		self.collisions.values()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<K, V> FromIterator<(K, V)> for SourceIndex
where
	K: Into<ResolutionKey>,
	V: Into<String>,
{
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut index = Self::default();
		for (key, content) in iter {
			index.insert(key, content);
		}
		index
	}
}
