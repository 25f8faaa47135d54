//! Slug helpers shared by the content directory, storage paths and media uploads.
//!
//! Slugs are the join key between the content directory and the article store,
//! and they double as storage object names, so anything accepted here must be
//! safe to use as a single path segment.

use std::path::Path;

use slug::slugify;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Errors that can occur while deriving a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Derive the slug of a content file from its name (`Getting Started.md` → `getting-started`).
pub fn slug_from_file_name(file_name: &str) -> Result<String, SlugError> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or_default();
    derive_slug(stem)
}

/// Whether a slug can be used verbatim as a file or object name.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// Fail with a validation error unless `slug` passes [`is_valid_slug`].
///
/// Rows written by other clients of the article store are not validated on
/// the way in, so every file or object path built from a slug goes through here.
pub fn check_slug(slug: &str) -> Result<(), DomainError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "slug `{slug}` cannot be used as a file or object name"
        )))
    }
}

/// Build a storage-safe file name for an uploaded media asset.
///
/// The stem is slugified and the extension lowercased; `Hero Image.PNG`
/// becomes `hero-image.png`.
pub fn safe_media_file_name(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
