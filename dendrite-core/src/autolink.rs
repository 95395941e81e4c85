//! Automatic mutual hyperlinking between graph-node posts.
//!
//! Any node's display name appearing in another node's text becomes a
//! markdown link around a `{{ post: id }}` directive, with no manual
//! markup. Author and tag names are picked up by the same mechanism, so
//! a mention of an author links to their page too.

use crate::models::Post;
use crate::repository::ContentRepository;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// One linkable name: the pattern matches either an existing markdown
/// link (consumed whole, left unchanged) or the literal name (captured).
struct LinkEntry {
    name: String,
    directive: String,
    pattern: Regex,
}

/// Priority-ordered table of every linkable name, longest first.
///
/// Longest-first ordering is the tie-break that makes a compound phrase
/// ("world spirit") win over a substring it contains ("spirit"): by the
/// time the shorter pattern runs, the phrase is already inside a link
/// span and gets skipped.
pub struct LinkTable {
    entries: Vec<LinkEntry>,
}

impl LinkTable {
    /// Build the table over all authors, tags, and graph-node posts.
    ///
    /// Entries are keyed case-insensitively; authors and tags are
    /// inserted before posts, so a graph node displaces a same-named
    /// author or tag and wins the collision.
    pub fn build<R: ContentRepository>(repo: &R) -> Self {
        let mut by_name: HashMap<String, (String, String)> = HashMap::new();

        for author in repo.authors() {
            let directive = format!("author: {}", author.name);
            by_name.insert(author.name.to_lowercase(), (author.name, directive));
        }

        for tag in repo.tags() {
            let directive = format!("tag: {}", tag.name);
            by_name.insert(tag.name.to_lowercase(), (tag.name, directive));
        }

        for post in repo.posts().into_iter().filter(|p| p.is_graph_node) {
            let directive = format!("post: {}", post.id);
            by_name.insert(post.name.to_lowercase(), (post.name, directive));
        }

        let mut entries: Vec<LinkEntry> = by_name
            .into_values()
            .map(|(name, directive)| {
                // Alternative (a): a whole existing markdown link,
                // non-capturing. Matching it first makes previously
                // inserted links opaque to this pattern instead of
                // exposing name fragments inside them.
                let pattern = Regex::new(&format!(
                    r"(?i)\[[^\]]*\]\([^)]*\)|({})",
                    regex::escape(&name)
                ))
                .expect("escaped name forms a valid pattern");
                LinkEntry {
                    name,
                    directive,
                    pattern,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.name
                .len()
                .cmp(&a.name.len())
                .then_with(|| a.name.cmp(&b.name))
        });

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite a node's markdown, wrapping mentions of other nodes'
    /// names in directive links. The node's own name is never linked;
    /// matched casing is preserved in the emitted display text.
    pub fn autolink(&self, node: &Post, markdown: &str) -> String {
        let own_name = node.name.to_lowercase();
        let mut text = markdown.to_string();

        for entry in &self.entries {
            if entry.name.to_lowercase() == own_name {
                continue;
            }

            text = entry
                .pattern
                .replace_all(&text, |caps: &Captures| match caps.get(1) {
                    Some(mention) => {
                        format!("[{}]({{{{ {} }}}})", mention.as_str(), entry.directive)
                    }
                    // An existing link span, re-emitted unchanged
                    None => caps[0].to_string(),
                })
                .into_owned();
        }

        text
    }
}
