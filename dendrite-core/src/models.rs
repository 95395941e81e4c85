//! Content model structs for posts, authors, tags, and file resources.

use crate::slug::slugify;
use chrono::{DateTime, Utc};
use dendrite_types::{AuthorId, PostId, ResourceId, TagId};
use serde::{Deserialize, Serialize};

/// A blog post record from the content store.
///
/// Graph nodes (`is_graph_node`) participate in automatic mutual
/// cross-linking and are hidden from normal listings by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,

    /// Display name, unique across posts
    pub name: String,

    /// Owning author
    pub author: AuthorId,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Participates in graph auto-linking
    pub is_graph_node: bool,

    pub allow_comments: bool,

    pub hidden: bool,

    pub allow_file_upload: bool,
}

impl Post {
    /// URL slug derived from the display name
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// Canonical URL for this post
    pub fn url(&self) -> String {
        format!("/posts/{}/{}/", self.id, self.slug())
    }
}

/// An author record, used as a link-resolution and path-derivation target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,

    /// Display name, unique across authors
    pub name: String,

    pub biography: String,
}

impl Author {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn url(&self) -> String {
        format!("/authors/{}/{}/", self.id, self.slug())
    }
}

/// A tag record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,

    /// Display name, unique across tags
    pub name: String,
}

impl Tag {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn url(&self) -> String {
        format!("/tags/{}/{}/", self.id, self.slug())
    }
}

/// A processed upload registered in the content store.
///
/// Every raw upload yields one row (non-image) or two rows (image:
/// full-size plus thumbnail sharing one content hash). Rows are deleted
/// and regenerated wholesale each time the owning post is compiled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResource {
    pub id: ResourceId,

    /// Content-hash-derived output file name, unique
    pub name: String,

    /// Original file name as authored, unique within the owning post
    pub clear_name: String,

    /// Human-readable title derived from the clear name
    pub title: String,

    pub is_image: bool,

    pub is_thumbnail: bool,

    /// Owning post
    pub post: PostId,
}

/// A file resource not yet registered with the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFileResource {
    pub name: String,
    pub clear_name: String,
    pub title: String,
    pub is_image: bool,
    pub is_thumbnail: bool,
    pub post: PostId,
}
