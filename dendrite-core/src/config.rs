//! Configuration parsing and derived on-disk paths.

use crate::models::Post;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching dendrite.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Longest edge allowed for generated thumbnails, in pixels
    #[serde(default = "default_max_thumbnail_width")]
    pub max_thumbnail_width: u32,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_max_thumbnail_width() -> u32 {
    512
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub author: String,

    #[serde(default)]
    pub description: String,

    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Per-post directories (markdown, uploads, rendered output)
    #[serde(default = "default_posts_dir")]
    pub posts: PathBuf,

    /// Graph-node markdown sources
    #[serde(default = "default_graph_dir")]
    pub graph: PathBuf,

    /// Generated content-addressed resources
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("posts")
}

fn default_graph_dir() -> PathBuf {
    PathBuf::from("thought-graph")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("static/gen/res")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            posts: default_posts_dir(),
            graph: default_graph_dir(),
            output: default_output_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Build a config rooted at a directory, using default paths.
    /// Intended for callers that assemble configuration in code.
    pub fn rooted_at<P: AsRef<Path>>(root: P, site: SiteConfig) -> Self {
        Self {
            site,
            paths: PathsConfig::default(),
            max_thumbnail_width: default_max_thumbnail_width(),
            config_path: Some(root.as_ref().join("dendrite.yml")),
        }
    }

    /// Per-post directory root, resolved relative to the config file
    pub fn posts_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.posts)
    }

    /// Graph-node source directory, resolved relative to the config file
    pub fn graph_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.graph)
    }

    /// Generated-resource output directory, resolved relative to the config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Directory holding a post's rendered output and uploads
    pub fn post_dir(&self, post: &Post) -> PathBuf {
        self.posts_dir().join(post.slug())
    }

    /// The author-written markdown source for a post.
    ///
    /// Graph-node sources live together in the graph directory; normal
    /// posts keep theirs inside the per-post directory.
    pub fn markdown_path(&self, post: &Post) -> PathBuf {
        if post.is_graph_node {
            self.graph_dir().join(format!("{}.md", post.slug()))
        } else {
            self.post_dir(post).join("post.md")
        }
    }

    /// The auto-linked interstage markdown for a graph node. Kept apart
    /// from the author's source file, which is never modified.
    pub fn interstage_path(&self, post: &Post) -> PathBuf {
        self.post_dir(post).join("interstage.md")
    }

    /// The rendered HTML output for a post
    pub fn html_path(&self, post: &Post) -> PathBuf {
        self.post_dir(post).join("post.html")
    }

    /// A post's raw-upload directory
    pub fn upload_dir(&self, post: &Post) -> PathBuf {
        self.post_dir(post).join("res")
    }

    /// On-disk location of a generated resource file
    pub fn resource_path(&self, file_name: &str) -> PathBuf {
        self.output_dir().join(file_name)
    }

    /// Public URL of a generated resource file
    pub fn resource_url(&self, file_name: &str) -> String {
        let root = self
            .paths
            .output
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}/{}", root, file_name)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dendrite_types::{AuthorId, PostId};

    fn test_site() -> SiteConfig {
        SiteConfig {
            title: "Test".into(),
            author: "Author".into(),
            description: "Desc".into(),
            url: "https://example.com".into(),
        }
    }

    fn test_post(name: &str, graph: bool) -> Post {
        Post {
            id: PostId::new(1),
            name: name.into(),
            author: AuthorId::new(1),
            created: Utc::now(),
            is_graph_node: graph,
            allow_comments: true,
            hidden: false,
            allow_file_upload: true,
        }
    }

    #[test]
    fn test_default_paths() {
        let config = Config::rooted_at("/srv/blog", test_site());

        assert_eq!(config.posts_dir(), PathBuf::from("/srv/blog/posts"));
        assert_eq!(config.graph_dir(), PathBuf::from("/srv/blog/thought-graph"));
        assert_eq!(config.output_dir(), PathBuf::from("/srv/blog/static/gen/res"));
        assert_eq!(config.max_thumbnail_width, 512);
    }

    #[test]
    fn test_post_paths() {
        let config = Config::rooted_at("/srv/blog", test_site());
        let post = test_post("My First Post", false);

        assert_eq!(
            config.markdown_path(&post),
            PathBuf::from("/srv/blog/posts/My-First-Post/post.md")
        );
        assert_eq!(
            config.html_path(&post),
            PathBuf::from("/srv/blog/posts/My-First-Post/post.html")
        );
        assert_eq!(
            config.upload_dir(&post),
            PathBuf::from("/srv/blog/posts/My-First-Post/res")
        );
    }

    #[test]
    fn test_graph_node_paths() {
        let config = Config::rooted_at("/srv/blog", test_site());
        let node = test_post("World Spirit", true);

        assert_eq!(
            config.markdown_path(&node),
            PathBuf::from("/srv/blog/thought-graph/World-Spirit.md")
        );
        assert_eq!(
            config.interstage_path(&node),
            PathBuf::from("/srv/blog/posts/World-Spirit/interstage.md")
        );
    }

    #[test]
    fn test_resource_url() {
        let config = Config::rooted_at("/srv/blog", test_site());
        assert_eq!(
            config.resource_url("abc123.png"),
            "/static/gen/res/abc123.png"
        );
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
site:
  title: My Blog
  author: Jane
  url: https://blog.example
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.site.title, "My Blog");
        assert_eq!(config.paths.posts, PathBuf::from("posts"));
        assert_eq!(config.max_thumbnail_width, 512);
    }
}
