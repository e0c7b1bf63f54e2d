mod common;

use clap::Parser;
use common::directive;
use common::mdext_cmd;
use common::write_tree;
use mdext_cli::Commands;
use mdext_cli::MdextCli;
use mdext_cli::OutputFormat;
use mdext_core::AnyEmptyResult;
use serde_json::Value;

#[test]
fn validate_passes_for_resolvable_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[
			("title.mdext", &format!("# Title\n{}\n", directive("common.mdsrc"))),
			("common.mdsrc", "Shared content.\n"),
		],
	)?;

	mdext_cmd()
		.arg("validate")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Validation passed"))
		.stderr(predicates::str::contains("1 valid template(s)"));

	Ok(())
}

#[test]
fn validate_fails_on_malformed_directive() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[(
			"page.mdext",
			"# Page\n\n<MarkDownExtension file=\"x.mdsrc\" />\n",
		)],
	)?;

	mdext_cmd()
		.arg("validate")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Validation failed."))
		.stderr(predicates::str::contains("1 error(s) in 1 file(s)"));

	Ok(())
}

#[test]
fn validate_json_reports_issue_details() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[(
			"page.mdext",
			"# Page\n\n<MarkDownExtension file=\"x.mdsrc\" />\n",
		)],
	)?;

	let output = mdext_cmd()
		.arg("validate")
		.arg("--format")
		.arg("json")
		.arg(tmp.path())
		.output()?;

	assert_eq!(output.status.code(), Some(1));
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], false);
	assert_eq!(json["valid_files_count"], 0);
	assert_eq!(json["invalid_files_count"], 1);
	let error = &json["errors"][0];
	assert_eq!(error["line_number"], 3);
	assert_eq!(error["source_file"], "page.mdext");
	assert_eq!(
		error["source_context"],
		"<MarkDownExtension file=\"x.mdsrc\" />"
	);
	assert!(
		error["message"]
			.as_str()
			.is_some_and(|message| message.contains("missing required 'operation' attribute"))
	);

	Ok(())
}

#[test]
fn validate_json_lists_warnings_without_failing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let line = directive("common.mdsrc");
	write_tree(
		tmp.path(),
		&[
			("page.mdext", &format!("{line}\ntext\n{line}\n")),
			("common.mdsrc", "shared"),
		],
	)?;

	let output = mdext_cmd()
		.args(["validate", "--format", "json"])
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], true);
	assert_eq!(json["warning_files_count"], 1);
	assert!(
		json["warnings"][0]["message"]
			.as_str()
			.is_some_and(|message| message.contains("first used on line 1"))
	);

	Ok(())
}

#[test]
fn validate_json_warns_on_circular_reference() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[
			("a.mdext", &directive("b.mdsrc")),
			("b.mdsrc", &directive("a.mdext")),
		],
	)?;

	let output = mdext_cmd()
		.args(["validate", "--format", "json"])
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert!(
		json["warnings"][0]["message"]
			.as_str()
			.is_some_and(|message| message.contains("Potential circular reference"))
	);

	Ok(())
}

#[test]
fn validate_missing_directory_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	mdext_cmd()
		.arg("validate")
		.arg(tmp.path().join("missing"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("input directory not found"));

	Ok(())
}

#[test]
fn validate_without_templates_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(tmp.path(), &[("readme.md", "# Readme")])?;

	mdext_cmd()
		.arg("validate")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("no template files"));

	Ok(())
}

#[test]
fn validate_rejects_invalid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_tree(
		tmp.path(),
		&[
			("mdext.toml", "resolution = \"nowhere\"\n"),
			("page.mdext", "# Page"),
		],
	)?;

	mdext_cmd()
		.arg("validate")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn validate_command_is_accepted_by_cli_parser() {
	let cli = MdextCli::parse_from(["mdext", "validate", "docs"]);
	match cli.command {
		Some(Commands::Validate { input, format }) => {
			assert_eq!(input, std::path::PathBuf::from("docs"));
			assert!(matches!(format, OutputFormat::Text));
		}
		_ => panic!("expected Validate command"),
	}

	let cli = MdextCli::parse_from(["mdext", "--no-color", "validate", "--format", "json", "docs"]);
	assert!(cli.no_color);
	match cli.command {
		Some(Commands::Validate { format, .. }) => {
			assert!(matches!(format, OutputFormat::Json));
		}
		_ => panic!("expected Validate command"),
	}
}
