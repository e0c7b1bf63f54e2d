mod common;

use clap::Parser;
use common::directive;
use common::mdext_cmd;
use common::write_tree;
use mdext_cli::Commands;
use mdext_cli::MdextCli;
use mdext_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use similar_asserts::assert_eq;

#[test]
fn combine_writes_compiled_templates_and_plain_markdown() -> AnyEmptyResult {
	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;
	write_tree(
		input.path(),
		&[
			("title.mdext", &format!("# Title\n{}", directive("common.mdsrc"))),
			("fragments/common.mdsrc", "Shared content."),
			("guides/setup.mdext", &format!("## Setup\n{}", directive("../fragments/common.mdsrc"))),
			("readme.md", "# Readme"),
		],
	)?;

	mdext_cmd()
		.arg("combine")
		.arg(input.path())
		.arg(output.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote 3 file(s)"));

	assert_eq!(
		std::fs::read_to_string(output.path().join("title.md"))?,
		"# Title\nShared content."
	);
	assert_eq!(
		std::fs::read_to_string(output.path().join("guides/setup.md"))?,
		"## Setup\nShared content."
	);
	assert_eq!(std::fs::read_to_string(output.path().join("readme.md"))?, "# Readme");
	assert!(!output.path().join("fragments").exists());
	assert!(!output.path().join("title.mdext").exists());

	Ok(())
}

#[test]
fn combine_refuses_to_write_with_errors() -> AnyEmptyResult {
	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;
	write_tree(input.path(), &[("page.mdext", &directive("missing.mdsrc"))])?;

	mdext_cmd()
		.arg("combine")
		.arg(input.path())
		.arg(output.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Combine aborted"));

	assert!(!output.path().join("page.md").exists());

	Ok(())
}

#[test]
fn combine_force_writes_placeholders() -> AnyEmptyResult {
	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;
	write_tree(input.path(), &[("page.mdext", &format!("A\n{}", directive("Missing.mdsrc")))])?;

	mdext_cmd()
		.arg("combine")
		.arg("--force")
		.arg(input.path())
		.arg(output.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("--force"));

	assert_eq!(
		std::fs::read_to_string(output.path().join("page.md"))?,
		"A\n<!-- Missing source: Missing.mdsrc -->"
	);

	Ok(())
}

#[test]
fn combine_dry_run_does_not_write() -> AnyEmptyResult {
	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;
	write_tree(
		input.path(),
		&[("page.mdext", &directive("common.mdsrc")), ("common.mdsrc", "shared")],
	)?;

	mdext_cmd()
		.arg("combine")
		.arg("--dry-run")
		.arg(input.path())
		.arg(output.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Dry run: would write 1 file(s)"))
		.stdout(predicates::str::contains("page.md"));

	assert!(!output.path().join("page.md").exists());

	Ok(())
}

#[test]
fn combine_diff_shows_changed_lines() -> AnyEmptyResult {
	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;
	write_tree(
		input.path(),
		&[("page.mdext", &format!("# Page\n{}\n", directive("common.mdsrc"))), ("common.mdsrc", "new line")],
	)?;
	write_tree(output.path(), &[("page.md", "# Page\nold line\n")])?;

	mdext_cmd()
		.arg("combine")
		.arg("--diff")
		.arg("--dry-run")
		.arg(input.path())
		.arg(output.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("-old line"))
		.stderr(predicates::str::contains("+new line"));

	assert_eq!(
		std::fs::read_to_string(output.path().join("page.md"))?,
		"# Page\nold line\n"
	);

	Ok(())
}

#[test]
fn combine_rejects_output_inside_input() -> AnyEmptyResult {
	let input = tempfile::tempdir()?;
	write_tree(input.path(), &[("page.mdext", "# Page")])?;

	mdext_cmd()
		.arg("combine")
		.arg(input.path())
		.arg(input.path().join("out"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("must not be inside"));

	assert!(!input.path().join("out").exists());

	Ok(())
}

#[test]
fn combine_respects_relative_path_resolution() -> AnyEmptyResult {
	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;
	write_tree(
		input.path(),
		&[
			("mdext.toml", "resolution = \"relative-path\"\n"),
			("a/page.mdext", &directive("intro.mdsrc")),
			("a/intro.mdsrc", "intro a"),
			("b/page.mdext", &directive("intro.mdsrc")),
			("b/intro.mdsrc", "intro b"),
		],
	)?;

	mdext_cmd()
		.arg("combine")
		.arg(input.path())
		.arg(output.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("ambiguous").not());

	assert_eq!(std::fs::read_to_string(output.path().join("a/page.md"))?, "intro a");
	assert_eq!(std::fs::read_to_string(output.path().join("b/page.md"))?, "intro b");

	Ok(())
}

#[test]
fn combine_flags_parse() {
	let cli = MdextCli::parse_from(["mdext", "combine", "--watch", "--diff", "in", "out"]);
	match cli.command {
		Some(Commands::Combine {
			watch,
			diff,
			force,
			dry_run,
			..
		}) => {
			assert!(watch);
			assert!(diff);
			assert!(!force);
			assert!(!dry_run);
		}
		_ => panic!("expected Combine command"),
	}
}
