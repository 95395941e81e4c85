//! Resolution of `{{ kind: value }}` reference directives.
//!
//! Directives let markdown link to files, authors, posts, and tags
//! without hard-coding URLs. Resolution runs once per post, after
//! auto-linking and before HTML rendering, and any unresolved directive
//! fails the whole compile.

use crate::compiler::CompileError;
use crate::config::Config;
use crate::models::Post;
use crate::repository::ContentRepository;
use dendrite_types::PostId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").unwrap());

/// The entity kinds sharing the generic directive shape: a prefix
/// keyword, a name-or-id lookup, and the `/{kind}s/{id}/{slug}/` URL
/// template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    Author,
    Post,
    Tag,
}

const ENTITY_KINDS: [EntityKind; 3] = [EntityKind::Author, EntityKind::Post, EntityKind::Tag];

impl EntityKind {
    fn prefix(self) -> &'static str {
        match self {
            EntityKind::Author => "author:",
            EntityKind::Post => "post:",
            EntityKind::Tag => "tag:",
        }
    }

    /// Look the entity up by its directive key, returning its canonical URL
    fn resolve<R: ContentRepository>(self, repo: &R, key: &str) -> Result<String, CompileError> {
        match self {
            EntityKind::Author => repo
                .author_by_name(key)
                .map(|a| a.url())
                .ok_or_else(|| CompileError::MissingAuthor(key.to_string())),
            EntityKind::Tag => repo
                .tag_by_name(key)
                .map(|t| t.url())
                .ok_or_else(|| CompileError::MissingTag(key.to_string())),
            EntityKind::Post => {
                let id: u64 = key
                    .parse()
                    .map_err(|_| CompileError::InvalidReference(format!("post: {key}")))?;
                repo.post(PostId::new(id))
                    .map(|p| p.url())
                    .ok_or(CompileError::MissingPost(id))
            }
        }
    }
}

/// Case-insensitive prefix check; returns the trimmed remainder on a hit.
fn has_prefix<'a>(reference: &'a str, prefix: &str) -> Option<&'a str> {
    let head = reference.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(reference[prefix.len()..].trim())
    } else {
        None
    }
}

/// Replace every `{{ ... }}` directive in the markdown with its resolved
/// URL or path. Unresolvable references are fatal.
pub fn resolve_references<R: ContentRepository>(
    repo: &R,
    config: &Config,
    post: &Post,
    markdown: &str,
) -> Result<String, CompileError> {
    // Clear-name map over the post's own resources, built fresh per post
    let name_mapping: HashMap<String, String> = repo
        .resources_for(post.id)
        .into_iter()
        .map(|r| (r.clear_name, r.name))
        .collect();

    let mut output = String::with_capacity(markdown.len());
    let mut last_end = 0;

    for caps in DIRECTIVE.captures_iter(markdown) {
        let whole = caps.get(0).expect("match always has a whole capture");
        let reference = caps[1].trim().to_string();

        output.push_str(&markdown[last_end..whole.start()]);
        output.push_str(&resolve_one(repo, config, &name_mapping, &reference)?);
        last_end = whole.end();
    }

    output.push_str(&markdown[last_end..]);
    Ok(output)
}

fn resolve_one<R: ContentRepository>(
    repo: &R,
    config: &Config,
    name_mapping: &HashMap<String, String>,
    reference: &str,
) -> Result<String, CompileError> {
    if let Some(clear_name) = has_prefix(reference, "file:") {
        return match name_mapping.get(clear_name) {
            Some(hashed_name) => Ok(config.resource_url(hashed_name)),
            None => Err(CompileError::MissingResource(clear_name.to_string())),
        };
    }

    for kind in ENTITY_KINDS {
        if let Some(key) = has_prefix(reference, kind.prefix()) {
            return kind.resolve(repo, key);
        }
    }

    Err(CompileError::InvalidReference(reference.to_string()))
}
