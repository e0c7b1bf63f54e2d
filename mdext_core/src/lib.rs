//! `mdext_core` is the core library for the `mdext` documentation assembler.
//! It merges reusable markdown fragments into template files through insert
//! directives and validates that every directive resolves safely.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Input directory
//!   → Collector (walks the tree, reads .md/.mdext/.mdsrc with bounded concurrency)
//!   → Source index (keys every insertable document)
//!   → Validator (malformed, missing, duplicate and circular directives)
//!   → Compiler (substitutes directives until nothing is left, at most 10 passes)
//! ```
//!
//! ## Directives
//!
//! ```markdown
//! # Title
//! <MarkDownExtension operation="insert" file="common.mdsrc" />
//! ```
//!
//! `*.mdext` files are templates and compile to `*.md`. `*.mdsrc` files are
//! fragments that are only ever inserted. Plain `*.md` files are copied
//! through and may be inserted too, as may the raw text of other templates.
//!
//! ## Modules
//!
//! - [`collector`]: Concurrent document collection from disk.
//! - [`config`]: Configuration loading from `mdext.toml`.
//! - [`directive`]: Directive discovery.
//! - [`project`]: One-call loading of an input directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use mdext_core::project::load_project;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> mdext_core::MdextResult<()> {
//! let ctx = load_project(Path::new("docs"), &CancellationToken::new()).await?;
//!
//! let result = ctx.validate();
//! if !result.is_valid() {
//!     eprintln!("{} error(s) found", result.errors.len());
//! }
//!
//! let compiled = ctx.compile();
//! # let _ = compiled;
//! # Ok(())
//! # }
//! ```

pub use compiler::*;
pub use config::*;
pub use document::*;
pub use error::*;
pub use key::*;
pub use sources::*;
pub use validator::*;

pub mod collector;
mod compiler;
pub mod config;
pub mod directive;
mod document;
#[allow(unused_assignments)]
mod error;
mod key;
pub mod project;
mod sources;
mod validator;

#[cfg(test)]
mod __fixtures;
