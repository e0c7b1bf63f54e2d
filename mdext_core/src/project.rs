use std::path::Path;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::MdextResult;
use crate::collector::CollectOptions;
use crate::collector::collect;
use crate::compiler::CompileOptions;
use crate::compiler::compile_documents;
use crate::config::MdextConfig;
use crate::document::Document;
use crate::sources::SourceIndex;
use crate::validator::ValidationResult;
use crate::validator::validate;

/// A collected input directory, ready for validation or compilation.
///
/// This is the main entry point returned by [`load_project`].
#[derive(Debug)]
pub struct ProjectContext {
	/// The input directory.
	pub root: PathBuf,
	/// Path of the config file that was applied, if any.
	pub config_path: Option<PathBuf>,
	/// Every collected document, sorted by relative path.
	pub documents: Vec<Document>,
	/// Insertable content built from `documents`.
	pub sources: SourceIndex,
	/// Limits applied when compiling.
	pub compile_options: CompileOptions,
}

impl ProjectContext {
	/// Build a context from documents that were collected elsewhere.
	pub fn from_documents(
		root: impl Into<PathBuf>,
		mut documents: Vec<Document>,
		config: Option<&MdextConfig>,
	) -> Self {
		documents.sort_by(|a, b| a.file_path().cmp(b.file_path()));
		let mode = config.map(|c| c.resolution).unwrap_or_default();
		let sources = SourceIndex::from_documents(&documents, mode);

		Self {
			root: root.into(),
			config_path: None,
			documents,
			sources,
			compile_options: CompileOptions::from_config(config),
		}
	}

	/// The `.mdext` documents in relative-path order.
	pub fn templates(&self) -> Vec<Document> {
		self.documents
			.iter()
			.filter(|doc| doc.is_template())
			.cloned()
			.collect()
	}

	/// Validate every template in the project.
	pub fn validate(&self) -> ValidationResult {
		validate(&self.templates(), &self.sources)
	}

	/// Compile every template and pass plain markdown through.
	pub fn compile(&self) -> Vec<Document> {
		compile_documents(&self.documents, &self.sources, &self.compile_options)
	}
}

/// Load the config found in `root`, collect its documents and index them.
pub async fn load_project(root: &Path, cancel: &CancellationToken) -> MdextResult<ProjectContext> {
	let config = if root.is_dir() {
		MdextConfig::load(root)?
	} else {
		None
	};
	let options = CollectOptions::from_config(config.as_ref());
	let documents = collect(root, &options, cancel).await?;

	let mut ctx = ProjectContext::from_documents(root, documents, config.as_ref());
	ctx.config_path = config.and_then(|_| MdextConfig::resolve_path(root));

	Ok(ctx)
}
