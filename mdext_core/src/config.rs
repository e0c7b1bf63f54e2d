use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::MdextError;
use crate::MdextResult;
use crate::key::ResolutionMode;

/// Default limit for a single compiled document in bytes (10 MB).
pub const DEFAULT_MAX_OUTPUT_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdext.toml", ".mdext.toml", ".config/mdext.toml"];

/// Configuration loaded from an `mdext.toml` file placed in the input
/// directory.
///
/// ```toml
/// resolution = "file-name"
/// max_output_size = 10485760
///
/// [collect]
/// concurrency = 4
///
/// [exclude]
/// patterns = ["drafts/", "*.wip.md"]
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MdextConfig {
	/// How directive file references are turned into lookup keys.
	#[serde(default)]
	pub resolution: ResolutionMode,
	/// Upper bound for the size of a single compiled document. A template
	/// that grows past it is emitted unprocessed.
	#[serde(default = "default_max_output_size")]
	pub max_output_size: u64,
	/// Settings for the document collector.
	#[serde(default)]
	pub collect: CollectConfig,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
}

impl Default for MdextConfig {
	fn default() -> Self {
		Self {
			resolution: ResolutionMode::default(),
			max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
			collect: CollectConfig::default(),
			exclude: ExcludeConfig::default(),
		}
	}
}

/// Settings for the document collector.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectConfig {
	/// Maximum number of file reads in flight. Defaults to the number of
	/// logical processors.
	#[serde(default)]
	pub concurrency: Option<NonZeroUsize>,
}

/// Configuration for excluding files and directories from collection.
///
/// Patterns follow gitignore syntax, relative to the input directory.
/// Supports negation (`!pattern`), directory markers (trailing `/`), and the
/// standard gitignore wildcards.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeConfig {
	/// Examples: `"drafts/"`, `"*.wip.md"`, `"!keep.md"`.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_max_output_size() -> u64 {
	DEFAULT_MAX_OUTPUT_SIZE
}

impl MdextConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no candidate exists.
	pub fn load(root: &Path) -> MdextResult<Option<MdextConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::parse(&content).map(Some)
	}

	/// Parse config file content.
	pub fn parse(content: &str) -> MdextResult<MdextConfig> {
		toml::from_str(content).map_err(|e| MdextError::ConfigParse(e.to_string()))
	}
}
