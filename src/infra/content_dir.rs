//! Markdown content directory backed by the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::application::repos::{ContentSource, RepoError};
use crate::domain::entities::ContentFileEntry;
use crate::domain::frontmatter::parse_document;
use crate::domain::slug::{is_valid_slug, slug_from_file_name};
use crate::domain::types::ContentFormat;

/// Flat directory of `<slug>.md` / `<slug>.mdx` files. Subdirectories are ignored.
#[derive(Debug, Clone)]
pub struct ContentDirectory {
    root: PathBuf,
}

impl ContentDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_entry(&self, path: &Path, file_name: &str) -> Option<ContentFileEntry> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ContentFormat::from_extension)?;

        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(target: "folio::content", file = file_name, error = %err, "unreadable content file skipped");
                return None;
            }
        };

        let (frontmatter, body) = match parse_document(file_name, &raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(target: "folio::content", file = file_name, error = %err, "invalid content file skipped");
                return None;
            }
        };

        let slug = match frontmatter.slug.as_deref().map(str::trim) {
            Some(slug) if is_valid_slug(slug) => slug.to_string(),
            Some(slug) if !slug.is_empty() => {
                warn!(
                    target: "folio::content",
                    file = file_name,
                    slug,
                    "content file with unusable slug skipped"
                );
                return None;
            }
            _ => match slug_from_file_name(file_name) {
                Ok(slug) => slug,
                Err(err) => {
                    warn!(target: "folio::content", file = file_name, error = %err, "content file without usable slug skipped");
                    return None;
                }
            },
        };

        Some(ContentFileEntry {
            id: file_name.to_string(),
            slug,
            format,
            frontmatter,
            body,
        })
    }
}

#[async_trait]
impl ContentSource for ContentDirectory {
    async fn list_entries(&self) -> Result<Vec<ContentFileEntry>, RepoError> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut files = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = item.file_name().to_str() {
                files.push((item.path(), name.to_string()));
            }
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let mut entries = Vec::with_capacity(files.len());
        for (path, name) in files {
            if let Some(entry) = self.read_entry(&path, &name).await {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn find_entry(&self, slug: &str) -> Result<Option<ContentFileEntry>, RepoError> {
        Ok(self
            .list_entries()
            .await?
            .into_iter()
            .find(|entry| entry.slug == slug))
    }

    async fn write_entry(
        &self,
        slug: &str,
        format: ContentFormat,
        document: &str,
    ) -> Result<String, RepoError> {
        if !is_valid_slug(slug) {
            return Err(RepoError::rejected(
                400,
                format!("slug `{slug}` would leave the content directory"),
            ));
        }
        fs::create_dir_all(&self.root).await?;

        let path = self.root.join(format!("{slug}.{}", format.extension()));
        fs::write(&path, document).await?;

        // Only one of `<slug>.md` / `<slug>.mdx` may exist at a time.
        let sibling = self.root.join(format!("{slug}.{}", format.other().extension()));
        match fs::remove_file(&sibling).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_valid_files_and_skips_the_rest() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("getting-started.md"),
            "---\ntitle: \"Getting Started\"\npubDate: 2024-01-01\n---\n\nHello\n",
        )
        .expect("write");
        std::fs::write(dir.path().join("broken.md"), "no frontmatter").expect("write");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");
        std::fs::write(
            dir.path().join("custom.mdx"),
            "---\ntitle: Custom\nslug: chosen-slug\n---\nBody",
        )
        .expect("write");

        let content = ContentDirectory::new(dir.path());
        let entries = content.list_entries().await.expect("list");
        let slugs: Vec<_> = entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["chosen-slug", "getting-started"]);
        assert_eq!(entries[0].format, ContentFormat::Mdx);

        let found = content
            .find_entry("getting-started")
            .await
            .expect("find")
            .expect("entry");
        assert_eq!(found.body, "Hello\n");
    }

    #[tokio::test]
    async fn missing_directory_is_empty_and_created_on_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("blog");
        let content = ContentDirectory::new(&root);
        assert!(content.list_entries().await.expect("list").is_empty());

        content
            .write_entry("post", ContentFormat::Mdx, "---\ntitle: \"P\"\n---\n\nx")
            .await
            .expect("write mdx");
        content
            .write_entry("post", ContentFormat::Md, "---\ntitle: \"P\"\n---\n\ny")
            .await
            .expect("write md");

        assert!(root.join("post.md").exists());
        assert!(!root.join("post.mdx").exists());
    }

    #[tokio::test]
    async fn slugs_cannot_leave_the_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("blog");
        let content = ContentDirectory::new(&root);

        let err = content
            .write_entry("../escaped", ContentFormat::Md, "---\ntitle: \"E\"\n---\n")
            .await
            .expect_err("escaping slug");
        assert!(matches!(err, RepoError::Rejected { status: 400, .. }));
        assert!(!dir.path().join("escaped.md").exists());

        std::fs::create_dir_all(&root).expect("mkdir");
        std::fs::write(root.join("sneaky.md"), "---\ntitle: S\nslug: ../up\n---\nx")
            .expect("write");
        assert!(content.list_entries().await.expect("list").is_empty());
    }
}
