//! # dendrite-core
//!
//! Content compilation pipeline for the dendrite publishing platform.
//!
//! This crate turns author-written markdown plus uploaded media into a
//! static, content-addressed output tree: it hashes and re-encodes
//! uploads, resolves `{{ kind: value }}` reference directives, auto-links
//! graph-node posts against each other, and renders the result to HTML.

pub mod autolink;
pub mod compiler;
pub mod config;
pub mod markdown;
pub mod models;
pub mod references;
pub mod repository;
pub mod resources;
pub mod slug;

pub use autolink::LinkTable;
pub use compiler::{CompileError, CompileOutcome, Compiler};
pub use config::Config;
pub use markdown::MarkdownProcessor;
pub use models::{Author, FileResource, NewFileResource, Post, Tag};
pub use repository::{ContentRepository, MemoryRepository};
pub use slug::{file_name_to_title, slugify};
