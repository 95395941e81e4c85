//! Upload processing: content hashing, image re-encoding, thumbnails.
//!
//! Every compile pass regenerates a post's file resources from scratch:
//! existing rows are dropped, the upload directory is walked, and each
//! file is written into the content-addressed output tree under a name
//! derived from a hash of its bytes.

use crate::compiler::CompileError;
use crate::config::Config;
use crate::models::{NewFileResource, Post};
use crate::repository::ContentRepository;
use crate::slug::file_name_to_title;
use image::imageops::FilterType;
use image::ImageFormat;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Hex digest length for output file names (16 bytes of the digest)
const HASH_HEX_LEN: usize = 32;

/// Canonical raster format for re-encoded images
const IMAGE_EXT: &str = "png";

/// Content hash of raw bytes, used verbatim as the output file stem.
/// Identical bytes always yield the identical name, whatever the upload
/// was called.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut digest = hex::encode(blake3::hash(bytes).as_bytes());
    digest.truncate(HASH_HEX_LEN);
    digest
}

/// Process every regular file under a post's upload directory.
///
/// Drops the post's existing file-resource rows, then hashes, classifies,
/// and writes each upload into the output tree. Rows are registered only
/// after every file operation succeeded; any I/O or codec failure aborts
/// with nothing registered.
pub fn process_uploads<R: ContentRepository>(
    repo: &mut R,
    config: &Config,
    post: &Post,
) -> Result<(), CompileError> {
    repo.delete_resources_for(post.id);

    let upload_dir = config.upload_dir(post);
    if !upload_dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(config.output_dir())?;

    let mut rows: Vec<NewFileResource> = Vec::new();
    let mut seen_clear_names: HashSet<String> = HashSet::new();
    let mut claim = |clear_name: &str| -> Result<(), CompileError> {
        if !seen_clear_names.insert(clear_name.to_string()) {
            return Err(CompileError::DuplicateClearName(clear_name.to_string()));
        }
        Ok(())
    };

    for entry in WalkDir::new(&upload_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();

        let bytes = fs::read(path)?;
        let hash = content_hash(&bytes);
        let title = file_name_to_title(&file_name);

        tracing::debug!("Processing upload {} -> {}", file_name, hash);

        // Classified by content, never by extension
        if image::guess_format(&bytes).is_ok() {
            let full_name = format!("{hash}.{IMAGE_EXT}");
            let thumb_name = format!("{hash}-thumb.{IMAGE_EXT}");

            claim(&format!("high-res-{file_name}"))?;
            claim(&file_name)?;

            let img = image::load_from_memory(&bytes)?;
            img.save_with_format(config.resource_path(&full_name), ImageFormat::Png)?;

            let thumb = if img.width() > config.max_thumbnail_width {
                img.resize(config.max_thumbnail_width, u32::MAX, FilterType::Lanczos3)
            } else {
                img.clone()
            };
            thumb.save_with_format(config.resource_path(&thumb_name), ImageFormat::Png)?;

            rows.push(NewFileResource {
                name: full_name,
                clear_name: format!("high-res-{file_name}"),
                title: title.clone(),
                is_image: true,
                is_thumbnail: false,
                post: post.id,
            });

            rows.push(NewFileResource {
                name: thumb_name,
                clear_name: file_name,
                title: format!("{title} (Thumbnail)"),
                is_image: true,
                is_thumbnail: true,
                post: post.id,
            });
        } else {
            let output_name = match extension_of(path) {
                Some(ext) => format!("{hash}.{ext}"),
                None => hash,
            };

            claim(&file_name)?;

            fs::copy(path, config.resource_path(&output_name))?;

            rows.push(NewFileResource {
                name: output_name,
                clear_name: file_name,
                title,
                is_image: false,
                is_thumbnail: false,
                post: post.id,
            });
        }
    }

    for row in rows {
        repo.insert_resource(row);
    }

    Ok(())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_string())
}
