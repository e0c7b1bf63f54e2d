use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

pub mod writer;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Assemble markdown documents from reusable fragments.",
	long_about = "mdext compiles `*.mdext` templates into plain markdown by replacing insert \
	              directives with the content of other files.\n\nA directive looks like \
	              this:\n  <MarkDownExtension operation=\"insert\" file=\"common.mdsrc\" />\n\nQuick \
	              start:\n  mdext validate docs        Report malformed, missing, duplicate and \
	              circular directives\n  mdext combine docs out     Write compiled `.md` files to \
	              `out`"
)]
pub struct MdextCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Validate every template in the input directory.
	///
	/// Reports malformed directives, empty or invalid file references and
	/// missing sources as errors. Duplicate directives, circular references
	/// and ambiguous source names are reported as warnings. Exits with a
	/// non-zero status code when any error is found.
	Validate {
		/// Directory containing `.mdext`, `.mdsrc` and `.md` files.
		input: PathBuf,

		/// Output format for validation results. Use `text` for
		/// human-readable output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Compile every template and write the results.
	///
	/// Templates are validated first. When validation reports errors nothing
	/// is written unless `--force` is given. Compiled templates and plain
	/// markdown files are written below the output directory, keeping their
	/// relative paths. Source fragments are not written.
	Combine {
		/// Directory containing `.mdext`, `.mdsrc` and `.md` files.
		input: PathBuf,

		/// Directory the compiled markdown is written to.
		output: PathBuf,

		/// Write output even when validation reports errors.
		#[arg(long, default_value_t = false)]
		force: bool,

		/// Preview changes without writing files. Prints which files would be
		/// written.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Show a line diff between each existing output file and its new
		/// content.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Watch the input directory and recompile whenever a file changes.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Contains the counts and
	/// every error and warning.
	Json,
}
