use std::path::Path;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use mdext_cli::Commands;
use mdext_cli::MdextCli;
use mdext_cli::OutputFormat;
use mdext_cli::writer::output_path;
use mdext_cli::writer::write_documents;
use mdext_core::Document;
use mdext_core::MdextError;
use mdext_core::ValidationIssue;
use mdext_core::ValidationResult;
use mdext_core::project::ProjectContext;
use mdext_core::project::load_project;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "MDEXT_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MdextCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose);

	let result = match &args.command {
		Some(Commands::Validate { input, format }) => run_validate(&args, input, *format),
		Some(Commands::Combine {
			input,
			output,
			force,
			dry_run,
			diff,
			watch,
		}) => {
			let options = CombineOptions {
				force: *force,
				dry_run: *dry_run,
				diff: *diff,
			};
			run_combine(&args, input, output, options, *watch)
		}
		None => {
			eprintln!("No subcommand specified. Run `mdext --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<MdextError>() {
				Ok(mdext_err) => {
					let report: miette::Report = (*mdext_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr. `MDEXT_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(color_enabled())
		.with_target(false)
		.without_time()
		.try_init()
		.ok();
}

fn load(rt: &Runtime, input: &Path) -> Result<ProjectContext, Box<dyn std::error::Error>> {
	let ctx = rt.block_on(load_project(input, &CancellationToken::new()))?;
	Ok(ctx)
}

/// Report a directory without templates. Returns false so the caller exits
/// with a failure code.
fn report_no_templates(input: &Path) -> bool {
	let report: miette::Report = MdextError::NoTemplates(input.display().to_string()).into();
	eprintln!("{report:?}");
	false
}

fn run_validate(
	args: &MdextCli,
	input: &Path,
	format: OutputFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
	let rt = Runtime::new()?;
	let ctx = load(&rt, input)?;
	let templates = ctx.templates();

	if templates.is_empty() {
		return Ok(report_no_templates(input));
	}

	if args.verbose {
		print_scan_summary(&ctx, templates.len());
	}

	let result = ctx.validate();

	match format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"ok": result.is_valid(),
				"templates": templates.len(),
				"valid_files_count": result.valid_files_count,
				"invalid_files_count": result.invalid_files_count(),
				"warning_files_count": result.warning_files_count(),
				"errors": result.errors,
				"warnings": result.warnings,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			print_issues(&result);
			if result.is_valid() {
				println!(
					"{} {} template(s) checked.",
					colored!("Validation passed:", green),
					templates.len()
				);
			} else {
				eprintln!();
				eprintln!("{}", colored!("Validation failed.", red));
			}
			eprintln!("{}", validation_summary(&result));
		}
	}

	Ok(result.is_valid())
}

#[derive(Debug, Clone, Copy)]
struct CombineOptions {
	force: bool,
	dry_run: bool,
	diff: bool,
}

fn run_combine(
	args: &MdextCli,
	input: &Path,
	output: &Path,
	options: CombineOptions,
	watch: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
	// Output nested in the input would be collected again as plain markdown
	// on the next run.
	if std::path::absolute(output)?.starts_with(std::path::absolute(input)?) {
		return Err(MdextError::InvalidArgument(format!(
			"the output directory `{}` must not be inside the input directory `{}`",
			output.display(),
			input.display()
		))
		.into());
	}

	let rt = Runtime::new()?;

	// Run the initial combine.
	let ok = run_combine_once(args, &rt, input, output, options)?;

	if !watch || options.dry_run {
		return Ok(ok);
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(input, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, combining...");
		if let Err(e) = run_combine_once(args, &rt, input, output, options) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

/// Validate, compile and write once. Returns false when validation errors
/// stopped the write.
fn run_combine_once(
	args: &MdextCli,
	rt: &Runtime,
	input: &Path,
	output: &Path,
	options: CombineOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
	let ctx = load(rt, input)?;
	let templates = ctx.templates();

	if templates.is_empty() {
		return Ok(report_no_templates(input));
	}

	if args.verbose {
		print_scan_summary(&ctx, templates.len());
	}

	let result = ctx.validate();
	print_issues(&result);

	if !result.is_valid() {
		if options.force {
			eprintln!(
				"{} writing output despite {} error(s) (--force).",
				colored!("warning:", yellow),
				result.errors.len()
			);
		} else {
			eprintln!();
			eprintln!(
				"{} {} error(s) found, nothing was written. Fix them or pass --force.",
				colored!("Combine aborted:", red),
				result.errors.len()
			);
			return Ok(false);
		}
	}

	let mut documents = ctx.compile();
	documents.sort_by(|a, b| a.file_path().cmp(b.file_path()));

	if options.diff {
		print_output_diffs(&documents, output);
	}

	if options.dry_run {
		println!(
			"Dry run: would write {} file(s) to {}:",
			documents.len(),
			output.display()
		);
		for document in &documents {
			println!("  {}", document.file_path().display());
		}
		return Ok(true);
	}

	let written = write_documents(&documents, output)?;
	println!(
		"Wrote {} file(s) to {}.",
		written.len(),
		output.display()
	);

	if args.verbose {
		for path in &written {
			println!("  {}", make_relative(path, output));
		}
	}

	Ok(true)
}

fn print_scan_summary(ctx: &ProjectContext, template_count: usize) {
	println!(
		"Collected {} document(s) from {}: {} template(s), {} source key(s)",
		ctx.documents.len(),
		ctx.root.display(),
		template_count,
		ctx.sources.len()
	);
	if let Some(path) = &ctx.config_path {
		println!("  Config: {}", path.display());
	}
}

fn print_issues(result: &ValidationResult) {
	for issue in &result.errors {
		eprintln!("{:?}", issue_to_report(issue, miette::Severity::Error));
	}
	for issue in &result.warnings {
		eprintln!("{:?}", issue_to_report(issue, miette::Severity::Warning));
	}
}

fn validation_summary(result: &ValidationResult) -> String {
	let mut parts = vec![format!("{} valid template(s)", result.valid_files_count)];
	if !result.is_valid() {
		parts.push(format!(
			"{} error(s) in {} file(s)",
			result.errors.len(),
			result.invalid_files_count()
		));
	}
	if result.has_warnings() {
		parts.push(format!(
			"{} warning(s) in {} file(s)",
			result.warnings.len(),
			result.warning_files_count()
		));
	}
	parts.join(", ")
}

/// Print a diff for every output file whose content would change.
fn print_output_diffs(documents: &[Document], output: &Path) {
	for document in documents {
		let path = output_path(document, output);
		let rel = document.file_path().display();
		match std::fs::read_to_string(&path) {
			Ok(current) if current == document.content() => {}
			Ok(current) => {
				eprintln!("{}", colored!(format!("--- {rel}"), bold));
				print_diff(&current, document.content());
			}
			Err(_) => {
				eprintln!("{} {rel}", colored!("new file:", green));
			}
		}
	}
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
		if change.missing_newline() {
			eprintln!();
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

/// Convert a `ValidationIssue` into a `miette::Report` with the given
/// severity for rich terminal display.
fn issue_to_report(issue: &ValidationIssue, severity: miette::Severity) -> miette::Report {
	let location = match (&issue.source_file, issue.line_number()) {
		(Some(file), Some(line)) => Some(format!("{file}:{line}")),
		(Some(file), None) => Some(file.clone()),
		(None, _) => None,
	};
	let message = match location {
		Some(location) => format!("[{location}] {}", issue.message),
		None => issue.message.clone(),
	};
	let code = match severity {
		miette::Severity::Error => "mdext::invalid_directive",
		_ => "mdext::directive_warning",
	};

	let mut diag_value = miette::MietteDiagnostic::new(message)
		.with_code(code)
		.with_severity(severity);
	if let Some(context) = issue.source_context() {
		diag_value = diag_value.with_help(format!("found: {context}"));
	}
	miette::Report::new(diag_value)
}
