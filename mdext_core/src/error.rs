use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdextError {
	#[error(transparent)]
	#[diagnostic(code(mdext::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid argument: {0}")]
	#[diagnostic(code(mdext::invalid_argument))]
	InvalidArgument(String),

	#[error("input directory not found: `{0}`")]
	#[diagnostic(
		code(mdext::directory_not_found),
		help("check the path passed to mdext, it must be an existing directory")
	)]
	DirectoryNotFound(String),

	#[error("access denied while listing `{path}`")]
	#[diagnostic(
		code(mdext::unauthorized_access),
		help("make sure the current user can read the input directory")
	)]
	UnauthorizedAccess { path: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(mdext::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdext::config_parse),
		help("check that mdext.toml is valid TOML with [collect] and/or [exclude] sections")
	)]
	ConfigParse(String),

	#[error("invalid exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(
		code(mdext::invalid_exclude_pattern),
		help("exclude patterns follow .gitignore syntax")
	)]
	InvalidExcludePattern { pattern: String, reason: String },

	#[error("compiled output for `{file}` exceeds {limit} bytes")]
	#[diagnostic(
		code(mdext::output_too_large),
		help("look for a directive that includes its own template, or raise `max_output_size`")
	)]
	OutputTooLarge { file: String, limit: u64 },

	#[error("no template files (*.mdext) found in `{0}`")]
	#[diagnostic(
		code(mdext::no_templates),
		help("templates must use the `.mdext` extension")
	)]
	NoTemplates(String),
}

pub type MdextResult<T> = Result<T, MdextError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
