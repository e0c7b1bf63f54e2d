use std::path::Path;
use std::path::PathBuf;

use mdext_core::Document;
use mdext_core::MdextResult;

/// Write every document to `output_dir`, keeping its relative path and
/// creating parent directories as needed. Returns the written paths.
pub fn write_documents(documents: &[Document], output_dir: &Path) -> MdextResult<Vec<PathBuf>> {
	let mut written = Vec::with_capacity(documents.len());

	for document in documents {
		let path = output_path(document, output_dir);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&path, document.content())?;
		tracing::debug!(path = %path.display(), "wrote document");
		written.push(path);
	}

	Ok(written)
}

/// Where `document` lands below `output_dir`.
pub fn output_path(document: &Document, output_dir: &Path) -> PathBuf {
	output_dir.join(document.file_path())
}
