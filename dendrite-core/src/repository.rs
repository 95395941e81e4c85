//! Content store access for the compilation pipeline.
//!
//! The compiler never talks to a database directly; it is handed a
//! [`ContentRepository`] and works against snapshots. The only rows the
//! pipeline ever mutates are file resources, which are regenerated
//! wholesale on every compile pass.

use crate::models::{Author, FileResource, NewFileResource, Post, Tag};
use dendrite_types::{AuthorId, PostId, ResourceId, TagId};
use std::collections::BTreeMap;

/// Read access to the content store, plus the file-resource mutations the
/// compiler needs. Reads return owned snapshots valid for one compile run.
pub trait ContentRepository {
    fn posts(&self) -> Vec<Post>;

    fn post(&self, id: PostId) -> Option<Post>;

    fn authors(&self) -> Vec<Author>;

    fn author_by_name(&self, name: &str) -> Option<Author>;

    fn tags(&self) -> Vec<Tag>;

    fn tag_by_name(&self, name: &str) -> Option<Tag>;

    /// File resources owned by a post
    fn resources_for(&self, post: PostId) -> Vec<FileResource>;

    fn insert_resource(&mut self, resource: NewFileResource) -> ResourceId;

    /// Drop all file resources owned by a post
    fn delete_resources_for(&mut self, post: PostId);

    /// Drop every file resource in the store
    fn clear_resources(&mut self);
}

/// In-memory content store.
///
/// Backs tests and any embedding that keeps its records in process. Insert
/// helpers assign ids sequentially, the way the store's autoincrement
/// columns would.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    posts: BTreeMap<PostId, Post>,
    authors: BTreeMap<AuthorId, Author>,
    tags: BTreeMap<TagId, Tag>,
    resources: BTreeMap<ResourceId, FileResource>,
    next_post: u64,
    next_author: u64,
    next_tag: u64,
    next_resource: u64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_post(&mut self, mut post: Post) -> PostId {
        self.next_post += 1;
        post.id = PostId::new(self.next_post);
        let id = post.id;
        self.posts.insert(id, post);
        id
    }

    pub fn insert_author(&mut self, mut author: Author) -> AuthorId {
        self.next_author += 1;
        author.id = AuthorId::new(self.next_author);
        let id = author.id;
        self.authors.insert(id, author);
        id
    }

    pub fn insert_tag(&mut self, mut tag: Tag) -> TagId {
        self.next_tag += 1;
        tag.id = TagId::new(self.next_tag);
        let id = tag.id;
        self.tags.insert(id, tag);
        id
    }
}

impl ContentRepository for MemoryRepository {
    fn posts(&self) -> Vec<Post> {
        self.posts.values().cloned().collect()
    }

    fn post(&self, id: PostId) -> Option<Post> {
        self.posts.get(&id).cloned()
    }

    fn authors(&self) -> Vec<Author> {
        self.authors.values().cloned().collect()
    }

    fn author_by_name(&self, name: &str) -> Option<Author> {
        self.authors.values().find(|a| a.name == name).cloned()
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.values().cloned().collect()
    }

    fn tag_by_name(&self, name: &str) -> Option<Tag> {
        self.tags.values().find(|t| t.name == name).cloned()
    }

    fn resources_for(&self, post: PostId) -> Vec<FileResource> {
        self.resources
            .values()
            .filter(|r| r.post == post)
            .cloned()
            .collect()
    }

    fn insert_resource(&mut self, resource: NewFileResource) -> ResourceId {
        self.next_resource += 1;
        let id = ResourceId::new(self.next_resource);
        self.resources.insert(
            id,
            FileResource {
                id,
                name: resource.name,
                clear_name: resource.clear_name,
                title: resource.title,
                is_image: resource.is_image,
                is_thumbnail: resource.is_thumbnail,
                post: resource.post,
            },
        );
        id
    }

    fn delete_resources_for(&mut self, post: PostId) {
        self.resources.retain(|_, r| r.post != post);
    }

    fn clear_resources(&mut self) {
        self.resources.clear();
    }
}
