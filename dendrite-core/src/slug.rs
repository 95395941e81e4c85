//! Slug derivation and upload-name prettification.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Derive the URL slug for a record name.
///
/// Rules:
/// - Whitespace runs become a single hyphen
/// - Characters outside `[A-Za-z0-9-]` are stripped
/// - Case is preserved
///
/// # Examples
///
/// ```
/// use dendrite_core::slugify;
///
/// assert_eq!(slugify("World Spirit"), "World-Spirit");
/// assert_eq!(slugify("Notes & Sketches"), "Notes-Sketches");
/// ```
pub fn slugify(input: &str) -> String {
    let with_hyphens = input
        .trim()
        .graphemes(true)
        .map(|g| {
            if g.chars().all(char::is_whitespace) {
                "-"
            } else {
                g
            }
        })
        .collect::<String>();

    let cleaned = with_hyphens
        .graphemes(true)
        .filter(|g| {
            g.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        .collect::<String>();

    HYPHEN_RUNS.replace_all(&cleaned, "-").trim_matches('-').to_string()
}

/// Derive a human-readable title from an uploaded file name: strip the
/// extension, turn hyphens and underscores into spaces, collapse
/// whitespace, and title-case each word.
///
/// # Examples
///
/// ```
/// use dendrite_core::file_name_to_title;
///
/// assert_eq!(file_name_to_title("my-holiday_photo.jpg"), "My Holiday Photo");
/// ```
pub fn file_name_to_title(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };

    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
