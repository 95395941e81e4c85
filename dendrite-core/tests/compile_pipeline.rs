//! End-to-end pipeline tests on real temporary content trees.

use anyhow::Result;
use chrono::Utc;
use dendrite_core::{
    Author, CompileError, CompileOutcome, Compiler, Config, ContentRepository, MemoryRepository,
    Post, Tag,
};
use dendrite_core::config::SiteConfig;
use dendrite_types::{AuthorId, PostId, TagId};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn test_config(root: &Path) -> Config {
    Config::rooted_at(
        root,
        SiteConfig {
            title: "Test Blog".into(),
            author: "Jane".into(),
            description: String::new(),
            url: "https://blog.example".into(),
        },
    )
}

fn post(name: &str, graph: bool) -> Post {
    Post {
        id: PostId::new(0),
        name: name.into(),
        author: AuthorId::new(1),
        created: Utc::now(),
        is_graph_node: graph,
        allow_comments: true,
        hidden: false,
        allow_file_upload: true,
    }
}

/// Write a normal post's markdown source under the config's posts dir.
fn write_post_source(config: &Config, post: &Post, markdown: &str) -> Result<()> {
    let path = config.markdown_path(post);
    fs::create_dir_all(path.parent().unwrap())?;
    fs::write(path, markdown)?;
    Ok(())
}

fn write_upload(config: &Config, post: &Post, name: &str, bytes: &[u8]) -> Result<()> {
    let dir = config.upload_dir(post);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(name), bytes)?;
    Ok(())
}

/// Snapshot of resource rows with ids stripped, for cross-run comparison.
fn resource_rows(repo: &MemoryRepository, post: PostId) -> Vec<(String, String, String, bool, bool)> {
    let mut rows: Vec<_> = repo
        .resources_for(post)
        .into_iter()
        .map(|r| (r.name, r.clear_name, r.title, r.is_image, r.is_thumbnail))
        .collect();
    rows.sort();
    rows
}

#[test]
fn full_compile_renders_posts_and_resolves_directives() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    repo.insert_author(Author {
        id: AuthorId::new(0),
        name: "Jane".into(),
        biography: "Writes things.".into(),
    });
    repo.insert_tag(Tag {
        id: TagId::new(0),
        name: "travel".into(),
    });

    let id = repo.insert_post(post("Summer Notes", false));
    let summer = repo.post(id).unwrap();
    write_post_source(
        &config,
        &summer,
        "# Summer\n\nRead more from {{ author: Jane }} under {{ tag: travel }}.\nAttached: {{ file: itinerary.txt }}",
    )?;
    write_upload(&config, &summer, "itinerary.txt", b"day one: the sea")?;

    Compiler::new(&mut repo, &config).compile_all()?;

    let html = fs::read_to_string(config.html_path(&summer))?;
    assert!(html.contains("<h1>Summer</h1>"));
    assert!(html.contains("/authors/1/Jane/"));
    assert!(html.contains("/tags/1/travel/"));

    // The directive now points at the hashed output name
    let rows = repo.resources_for(id);
    assert_eq!(rows.len(), 1);
    assert!(html.contains(&format!("/static/gen/res/{}", rows[0].name)));
    assert!(config.resource_path(&rows[0].name).is_file());

    Ok(())
}

#[test]
fn image_uploads_yield_full_size_and_thumbnail() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let id = repo.insert_post(post("Gallery", false));
    let gallery = repo.post(id).unwrap();
    write_post_source(&config, &gallery, "See {{ file: holiday-photo.png }}.")?;

    let img_dir = config.upload_dir(&gallery);
    fs::create_dir_all(&img_dir)?;
    image::RgbImage::from_pixel(800, 600, image::Rgb([40, 90, 160]))
        .save(img_dir.join("holiday-photo.png"))?;

    Compiler::new(&mut repo, &config).compile_all()?;

    let mut rows = repo.resources_for(id);
    rows.sort_by_key(|r| r.is_thumbnail);
    assert_eq!(rows.len(), 2);

    let full = &rows[0];
    let thumb = &rows[1];

    assert!(full.is_image && !full.is_thumbnail);
    assert_eq!(full.clear_name, "high-res-holiday-photo.png");
    assert_eq!(full.title, "Holiday Photo");

    assert!(thumb.is_image && thumb.is_thumbnail);
    assert_eq!(thumb.clear_name, "holiday-photo.png");
    assert_eq!(thumb.title, "Holiday Photo (Thumbnail)");

    // Same content hash, distinguished by suffix
    assert_eq!(
        full.name.trim_end_matches(".png"),
        thumb.name.trim_end_matches("-thumb.png")
    );

    // Thumbnail respects the width limit and keeps the aspect ratio
    let thumb_img = image::open(config.resource_path(&thumb.name))?;
    assert_eq!(thumb_img.width(), 512);
    assert_eq!(thumb_img.height(), 384);

    // The file: directive embeds the thumbnail, not the full image
    let html = fs::read_to_string(config.html_path(&gallery))?;
    assert!(html.contains(&thumb.name));

    Ok(())
}

#[test]
fn identical_bytes_get_identical_output_names() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let id = repo.insert_post(post("Files", false));
    let files = repo.post(id).unwrap();
    write_post_source(&config, &files, "nothing to resolve")?;
    write_upload(&config, &files, "first.dat", b"same bytes")?;
    write_upload(&config, &files, "second.dat", b"same bytes")?;

    Compiler::new(&mut repo, &config).compile_all()?;

    let rows = repo.resources_for(id);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, rows[1].name);

    Ok(())
}

#[test]
fn recompiling_unchanged_content_is_idempotent() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let id = repo.insert_post(post("Stable", false));
    let stable = repo.post(id).unwrap();
    write_post_source(&config, &stable, "# Stable\n\nplain content")?;
    write_upload(&config, &stable, "notes.txt", b"unchanging")?;

    Compiler::new(&mut repo, &config).compile_all()?;
    let first_html = fs::read_to_string(config.html_path(&stable))?;
    let first_rows = resource_rows(&repo, id);

    Compiler::new(&mut repo, &config).compile_all()?;
    let second_html = fs::read_to_string(config.html_path(&stable))?;
    let second_rows = resource_rows(&repo, id);

    assert_eq!(first_html, second_html);
    assert_eq!(first_rows, second_rows);

    Ok(())
}

#[test]
fn graph_nodes_are_mutually_linked() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let spirit_id = repo.insert_post(post("Spirit", true));
    let world_id = repo.insert_post(post("World Spirit", true));

    let spirit = repo.post(spirit_id).unwrap();
    let world = repo.post(world_id).unwrap();

    fs::create_dir_all(config.graph_dir())?;
    fs::write(
        config.markdown_path(&spirit),
        "Hegel says the world spirit moves through history.",
    )?;
    fs::write(config.markdown_path(&world), "Not just any spirit.")?;

    Compiler::new(&mut repo, &config).compile_all()?;

    // "world spirit" links to the World Spirit node, once, casing kept
    let spirit_html = fs::read_to_string(config.html_path(&spirit))?;
    assert!(spirit_html
        .contains(r#"<a href="/posts/2/World-Spirit/">world spirit</a>"#));
    assert_eq!(spirit_html.matches("<a href").count(), 1);

    // The shorter name links back; no self-link for "spirit" inside it
    let world_html = fs::read_to_string(config.html_path(&world))?;
    assert!(world_html.contains(r#"<a href="/posts/1/Spirit/">spirit</a>"#));

    // The author's graph source is untouched; the interstage holds the links
    let source = fs::read_to_string(config.markdown_path(&spirit))?;
    assert!(!source.contains("{{"));
    let interstage = fs::read_to_string(config.interstage_path(&spirit))?;
    assert!(interstage.contains("[world spirit]({{ post: 2 }})"));

    Ok(())
}

#[test]
fn single_compile_skips_graph_nodes() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let node_id = repo.insert_post(post("Spirit", true));
    let plain_id = repo.insert_post(post("Plain", false));
    let plain = repo.post(plain_id).unwrap();
    write_post_source(&config, &plain, "hello")?;

    let mut compiler = Compiler::new(&mut repo, &config);
    assert_eq!(
        compiler.compile_post(node_id)?,
        CompileOutcome::SkippedGraphNode
    );
    assert_eq!(compiler.compile_post(plain_id)?, CompileOutcome::Compiled);

    // The skipped node produced no output
    let node = repo.post(node_id).unwrap();
    assert!(!config.html_path(&node).exists());
    assert!(config.html_path(&plain).is_file());

    Ok(())
}

#[test]
fn missing_author_aborts_before_html_is_written() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let id = repo.insert_post(post("Broken", false));
    let broken = repo.post(id).unwrap();
    write_post_source(&config, &broken, "by {{ author: Nobody }}")?;

    let err = Compiler::new(&mut repo, &config)
        .compile_all()
        .unwrap_err();
    assert!(matches!(err, CompileError::MissingAuthor(ref name) if name == "Nobody"));
    assert!(!config.html_path(&broken).exists());

    Ok(())
}

#[test]
fn earlier_posts_survive_a_later_failure() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let good_id = repo.insert_post(post("Alpha", false));
    let bad_id = repo.insert_post(post("Beta", false));

    let good = repo.post(good_id).unwrap();
    let bad = repo.post(bad_id).unwrap();
    write_post_source(&config, &good, "fine")?;
    write_post_source(&config, &bad, "{{ post: 999 }}")?;

    let err = Compiler::new(&mut repo, &config)
        .compile_all()
        .unwrap_err();
    assert!(matches!(err, CompileError::MissingPost(999)));

    // Batch is not atomic across posts: Alpha's output stays
    assert!(config.html_path(&good).is_file());
    assert!(!config.html_path(&bad).exists());

    Ok(())
}

#[test]
fn duplicate_clear_names_are_rejected() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let id = repo.insert_post(post("Collide", false));
    let collide = repo.post(id).unwrap();
    write_post_source(&config, &collide, "text")?;

    // Same file name in two nested upload subdirectories
    let dir = config.upload_dir(&collide);
    fs::create_dir_all(dir.join("a"))?;
    fs::create_dir_all(dir.join("b"))?;
    fs::write(dir.join("a/notes.txt"), b"one")?;
    fs::write(dir.join("b/notes.txt"), b"two")?;

    let err = Compiler::new(&mut repo, &config)
        .compile_all()
        .unwrap_err();
    assert!(matches!(err, CompileError::DuplicateClearName(ref name) if name == "notes.txt"));

    // Nothing was registered for the failed post
    assert!(repo.resources_for(id).is_empty());

    Ok(())
}

#[test]
fn compile_graph_only_rebuilds_nodes() -> Result<()> {
    let tmp = TempDir::new()?;
    let config = test_config(tmp.path());
    let mut repo = MemoryRepository::new();

    let node_id = repo.insert_post(post("Geist", true));
    let plain_id = repo.insert_post(post("Plain", false));

    let node = repo.post(node_id).unwrap();
    let plain = repo.post(plain_id).unwrap();

    fs::create_dir_all(config.graph_dir())?;
    fs::write(config.markdown_path(&node), "alone in the graph")?;
    write_post_source(&config, &plain, "normal")?;

    Compiler::new(&mut repo, &config).compile_graph()?;

    assert!(config.html_path(&node).is_file());
    assert!(!config.html_path(&plain).exists());

    Ok(())
}
