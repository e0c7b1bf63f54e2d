use std::future::Future;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::Document;
use crate::ResolutionMode;
use crate::SourceIndex;
use crate::collector::DocumentReader;
use crate::collector::FsReader;

/// Build a valid insert directive for `file`.
pub fn directive(file: &str) -> String {
	format!(r#"<MarkDownExtension operation="insert" file="{file}" />"#)
}

pub fn doc(path: &str, content: &str) -> Document {
	Document::new(path, content)
}

/// Index the given `(path, content)` pairs as collected documents.
pub fn index(files: &[(&str, &str)]) -> SourceIndex {
	index_with_mode(files, ResolutionMode::FileName)
}

pub fn index_with_mode(files: &[(&str, &str)], mode: ResolutionMode) -> SourceIndex {
	let documents: Vec<Document> = files
		.iter()
		.map(|(path, content)| doc(path, content))
		.collect();
	SourceIndex::from_documents(&documents, mode)
}

/// Write `(relative path, content)` pairs below `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> io::Result<()> {
	for (path, content) in files {
		let full = root.join(path);
		if let Some(parent) = full.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(full, content)?;
	}
	Ok(())
}

/// A reader that records how many reads overlap and can fail chosen files.
#[derive(Debug, Default)]
pub struct TrackingReader {
	in_flight: AtomicUsize,
	peak: AtomicUsize,
	reads: AtomicUsize,
	fail_suffix: Option<String>,
}

impl TrackingReader {
	pub fn failing(suffix: &str) -> Self {
		Self {
			fail_suffix: Some(suffix.to_string()),
			..Self::default()
		}
	}

	pub fn peak(&self) -> usize {
		self.peak.load(Ordering::SeqCst)
	}

	pub fn reads(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}
}

impl DocumentReader for TrackingReader {
	fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
		FsReader.read_dir(dir)
	}

	fn read_text(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send {
		let path = path.to_path_buf();
		async move {
			self.reads.fetch_add(1, Ordering::SeqCst);
			let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
			self.peak.fetch_max(current, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(5)).await;
			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			if self
				.fail_suffix
				.as_deref()
				.is_some_and(|suffix| path.to_string_lossy().ends_with(suffix))
			{
				return Err(io::Error::other("simulated read failure"));
			}

			tokio::fs::read_to_string(&path).await
		}
	}
}

/// A filesystem reader that is denied access to every directory named
/// `dir_name`.
#[derive(Debug)]
pub struct DeniedDirReader {
	pub dir_name: String,
}

impl DeniedDirReader {
	pub fn new(dir_name: impl Into<String>) -> Self {
		Self {
			dir_name: dir_name.into(),
		}
	}
}

impl DocumentReader for DeniedDirReader {
	fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
		if dir
			.file_name()
			.is_some_and(|name| name.to_string_lossy() == self.dir_name)
		{
			return Err(io::Error::from(io::ErrorKind::PermissionDenied));
		}
		FsReader.read_dir(dir)
	}

	fn read_text(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send {
		tokio::fs::read_to_string(path.to_path_buf())
	}
}
