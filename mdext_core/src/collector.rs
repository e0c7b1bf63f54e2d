use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::MdextError;
use crate::MdextResult;
use crate::config::MdextConfig;
use crate::document::Document;
use crate::document::DocumentKind;

/// Options for controlling how documents are collected.
#[derive(Debug, Clone)]
pub struct CollectOptions {
	/// Maximum number of file reads in flight at once.
	pub concurrency: NonZeroUsize,
	/// Gitignore-style patterns to exclude, relative to the root.
	pub exclude_patterns: Vec<String>,
}

impl Default for CollectOptions {
	fn default() -> Self {
		Self {
			concurrency: default_concurrency(),
			exclude_patterns: Vec::new(),
		}
	}
}

impl CollectOptions {
	/// Construct [`CollectOptions`] from an [`MdextConfig`].
	pub fn from_config(config: Option<&MdextConfig>) -> Self {
		let concurrency = config
			.and_then(|c| c.collect.concurrency)
			.unwrap_or_else(default_concurrency);
		let exclude_patterns = config
			.map(|c| c.exclude.patterns.clone())
			.unwrap_or_default();

		Self {
			concurrency,
			exclude_patterns,
		}
	}
}

/// The number of logical processors, or one when it cannot be determined.
pub fn default_concurrency() -> NonZeroUsize {
	std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Disk access used by the collector.
pub trait DocumentReader: Send + Sync + 'static {
	/// The entries of a single directory.
	fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

	/// Every file below `root`, recursively.
	///
	/// Failing to list `root` itself is an error. A directory below it that
	/// cannot be listed is skipped with a warning.
	fn list_files(&self, root: &Path) -> MdextResult<Vec<PathBuf>> {
		let mut walk = DirWalk::default();
		walk_dir(self, root, &mut walk)?;
		// Sort for deterministic ordering.
		walk.files.sort();
		Ok(walk.files)
	}

	/// The full text of a file.
	fn read_text(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;
}

/// Reads straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl DocumentReader for FsReader {
	fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
		std::fs::read_dir(dir)?
			.map(|entry| entry.map(|entry| entry.path()))
			.collect()
	}

	fn read_text(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send {
		tokio::fs::read_to_string(path.to_path_buf())
	}
}

#[derive(Default)]
struct DirWalk {
	files: Vec<PathBuf>,
	/// Canonical paths of the directories enclosing the one being listed.
	ancestors: Vec<PathBuf>,
	/// Canonical paths of every directory listed so far.
	visited: HashSet<PathBuf>,
}

fn walk_dir<R: DocumentReader + ?Sized>(
	reader: &R,
	dir: &Path,
	walk: &mut DirWalk,
) -> MdextResult<()> {
	let is_root = walk.ancestors.is_empty();
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

	// A link back to an enclosing directory would recurse forever.
	if walk.ancestors.contains(&canonical) {
		return Err(MdextError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}
	if !walk.visited.insert(canonical.clone()) {
		tracing::debug!(path = %dir.display(), "directory already collected through another path, skipping");
		return Ok(());
	}

	let entries = match reader.read_dir(dir) {
		Ok(entries) => entries,
		Err(e) if is_root => {
			return Err(if e.kind() == io::ErrorKind::PermissionDenied {
				MdextError::UnauthorizedAccess {
					path: dir.display().to_string(),
				}
			} else {
				MdextError::Io(e)
			});
		}
		Err(e) => {
			tracing::warn!(
				path = %dir.display(),
				error = %e,
				"failed to list directory, skipping"
			);
			return Ok(());
		}
	};

	let mut dirs = Vec::new();
	let mut linked_dirs = Vec::new();
	for path in entries {
		if !path.is_dir() {
			walk.files.push(path);
		} else if path.is_symlink() {
			linked_dirs.push(path);
		} else {
			dirs.push(path);
		}
	}
	// Real directories first so their own paths win over symlinked aliases.
	dirs.sort();
	linked_dirs.sort();

	walk.ancestors.push(canonical);
	for sub in dirs.into_iter().chain(linked_dirs) {
		walk_dir(reader, &sub, walk)?;
	}
	walk.ancestors.pop();

	Ok(())
}

/// Build a `Gitignore` matcher from the configured exclude patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> MdextResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			MdextError::InvalidExcludePattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		MdextError::InvalidExcludePattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Collect every `.md`, `.mdext` and `.mdsrc` file below `root` from disk.
pub async fn collect(
	root: &Path,
	options: &CollectOptions,
	cancel: &CancellationToken,
) -> MdextResult<Vec<Document>> {
	collect_with(Arc::new(FsReader), root, options, cancel).await
}

/// Collect documents through the given reader.
///
/// Reads run concurrently, at most `options.concurrency` at a time. A file
/// that cannot be read becomes a document with empty content. Cancellation is
/// checked before each read is scheduled; reads already running are allowed
/// to finish and their documents are returned. The order of the returned
/// documents is unspecified.
pub async fn collect_with<R: DocumentReader>(
	reader: Arc<R>,
	root: &Path,
	options: &CollectOptions,
	cancel: &CancellationToken,
) -> MdextResult<Vec<Document>> {
	if root.as_os_str().to_string_lossy().trim().is_empty() {
		return Err(MdextError::InvalidArgument(
			"the collection root must not be blank".to_string(),
		));
	}

	if !root.is_dir() {
		return Err(MdextError::DirectoryNotFound(root.display().to_string()));
	}

	let exclude = build_exclude_matcher(root, &options.exclude_patterns)?;
	let files = {
		let reader = Arc::clone(&reader);
		let root = root.to_path_buf();
		let span = tracing::Span::current();
		tokio::task::spawn_blocking(move || {
			let _entered = span.enter();
			reader.list_files(&root)
		})
			.await
			.map_err(|e| MdextError::Io(io::Error::other(e)))??
	};

	let semaphore = Arc::new(Semaphore::new(options.concurrency.get()));
	let mut reads = JoinSet::new();

	for path in files {
		let Ok(relative) = path.strip_prefix(root).map(Path::to_path_buf) else {
			tracing::warn!(path = %path.display(), "listed file is outside the root, skipping");
			continue;
		};
		if DocumentKind::classify(&relative).is_none() {
			continue;
		}
		if exclude.matched_path_or_any_parents(&path, false).is_ignore() {
			tracing::debug!(path = %relative.display(), "excluded");
			continue;
		}

		let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
			break;
		};
		if cancel.is_cancelled() {
			tracing::debug!("collection cancelled, no further reads scheduled");
			break;
		}

		let reader = Arc::clone(&reader);
		reads.spawn(async move {
			let _permit = permit;
			let result = reader.read_text(&path).await;
			(path, relative, result)
		});
	}

	let mut documents = Vec::with_capacity(reads.len());
	while let Some(joined) = reads.join_next().await {
		let (path, relative, result) = joined.map_err(|e| MdextError::Io(io::Error::other(e)))?;
		let content = result.unwrap_or_else(|e| {
			tracing::warn!(
				path = %path.display(),
				error = %e,
				"failed to read file, continuing with empty content"
			);
			String::new()
		});
		documents.push(Document::new(relative, content));
	}

	tracing::debug!(
		root = %root.display(),
		count = documents.len(),
		"collected documents"
	);

	Ok(documents)
}
