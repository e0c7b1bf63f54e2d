use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn mdext_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mdext"));
	cmd.env("NO_COLOR", "1").env_remove("MDEXT_LOG");
	cmd
}

/// Write `(relative path, content)` pairs below `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
	for (path, content) in files {
		let full = root.join(path);
		if let Some(parent) = full.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(full, content)?;
	}
	Ok(())
}

pub fn directive(file: &str) -> String {
	format!(r#"<MarkDownExtension operation="insert" file="{file}" />"#)
}
