//! Compilation orchestration: full rebuilds and per-post compiles.
//!
//! A full rebuild is linear: clean the output tree, build the link table
//! if any graph node exists, then per post auto-link (graph nodes),
//! process uploads, resolve references, render, write. A fatal error
//! anywhere aborts the remaining run; already-written posts stay on disk.

use crate::autolink::LinkTable;
use crate::config::Config;
use crate::markdown::MarkdownProcessor;
use crate::models::Post;
use crate::references::resolve_references;
use crate::repository::ContentRepository;
use crate::resources::process_uploads;
use dendrite_types::PostId;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Missing file: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Missing resource \"{0}\"")]
    MissingResource(String),

    #[error("Missing author \"{0}\"")]
    MissingAuthor(String),

    #[error("Missing post \"{0}\"")]
    MissingPost(u64),

    #[error("Missing tag \"{0}\"")]
    MissingTag(String),

    #[error("Invalid reference type: \"{0}\"")]
    InvalidReference(String),

    #[error("Duplicate upload name \"{0}\"")]
    DuplicateClearName(String),
}

/// What a single-post compile actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled,

    /// The post is a graph node, which cannot be compiled outside the
    /// full-graph pipeline; the operation was skipped, not failed.
    SkippedGraphNode,
}

/// Drives the pipeline against one repository and config for the
/// duration of a compile run.
pub struct Compiler<'a, R: ContentRepository> {
    repo: &'a mut R,
    config: &'a Config,
    processor: MarkdownProcessor,
}

impl<'a, R: ContentRepository> Compiler<'a, R> {
    pub fn new(repo: &'a mut R, config: &'a Config) -> Self {
        Self {
            repo,
            config,
            processor: MarkdownProcessor::new(),
        }
    }

    /// Full rebuild of the output tree and all resource records.
    pub fn compile_all(&mut self) -> Result<(), CompileError> {
        self.clean_output()?;

        let posts = self.repo.posts();
        let table = posts
            .iter()
            .any(|p| p.is_graph_node)
            .then(|| LinkTable::build(self.repo));

        for post in &posts {
            tracing::info!("Compiling post \"{}\"", post.name);
            if post.is_graph_node {
                if let Some(table) = &table {
                    self.write_interstage(table, post)?;
                }
            }
            self.compile_inner(post)?;
        }

        Ok(())
    }

    /// Compile a single post outside a full rebuild.
    ///
    /// Graph nodes need the shared link table and are skipped here with
    /// a warning rather than an error, so batch callers keep going.
    pub fn compile_post(&mut self, id: PostId) -> Result<CompileOutcome, CompileError> {
        let post = self
            .repo
            .post(id)
            .ok_or(CompileError::MissingPost(id.as_u64()))?;

        if post.is_graph_node {
            tracing::warn!("Cannot compile graph post \"{}\" individually", post.name);
            return Ok(CompileOutcome::SkippedGraphNode);
        }

        tracing::info!("Compiling post \"{}\"", post.name);
        self.compile_inner(&post)?;
        Ok(CompileOutcome::Compiled)
    }

    /// Auto-link and compile every graph node.
    pub fn compile_graph(&mut self) -> Result<(), CompileError> {
        let table = LinkTable::build(self.repo);

        let nodes: Vec<Post> = self
            .repo
            .posts()
            .into_iter()
            .filter(|p| p.is_graph_node)
            .collect();

        for node in &nodes {
            tracing::info!("Compiling graph post \"{}\"", node.name);
            self.write_interstage(&table, node)?;
            self.compile_inner(node)?;
        }

        Ok(())
    }

    /// Delete and recreate the generated-resource directory and purge
    /// every file-resource row.
    fn clean_output(&mut self) -> Result<(), CompileError> {
        tracing::info!("Cleaning output directory");
        let output = self.config.output_dir();
        if output.exists() {
            fs::remove_dir_all(&output)?;
        }
        fs::create_dir_all(&output)?;

        self.repo.clear_resources();
        Ok(())
    }

    /// Auto-link a node's source markdown and persist the interstage.
    /// The author's source file is never touched.
    fn write_interstage(&self, table: &LinkTable, node: &Post) -> Result<(), CompileError> {
        let source = read_source(&self.config.markdown_path(node))?;
        let interstage = table.autolink(node, &source);

        let path = self.config.interstage_path(node);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, interstage)?;
        Ok(())
    }

    /// The shared per-post tail: uploads, reference resolution,
    /// rendering, HTML write. Nothing is written to the post's HTML path
    /// until resolution and rendering have fully succeeded.
    fn compile_inner(&mut self, post: &Post) -> Result<(), CompileError> {
        process_uploads(self.repo, self.config, post)?;

        let source_path = if post.is_graph_node {
            self.config.interstage_path(post)
        } else {
            self.config.markdown_path(post)
        };

        let markdown_src = read_source(&source_path)?;
        let markdown_src = resolve_references(self.repo, self.config, post, &markdown_src)?;
        let html_src = self.processor.convert(&markdown_src);

        let html_path = self.config.html_path(post);
        if let Some(parent) = html_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(html_path, html_src)?;
        Ok(())
    }
}

fn read_source(path: &Path) -> Result<String, CompileError> {
    if !path.is_file() {
        return Err(CompileError::MissingSource(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?.trim().to_string())
}
