//! Slug-keyed reconciliation between the content directory and the article store.
//!
//! Data moves in one direction per call: files become rows (import, sync) or
//! rows become files (export). Nothing is ever deleted on either side.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::try_join;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::client::ContentClient;
use crate::application::error::AppError;
use crate::application::repos::ContentSource;
use crate::domain::entities::{
    ArticleRecord, BatchItemResult, BatchSummary, ContentFileEntry, ContentMappingEntry,
};
use crate::domain::frontmatter::{Frontmatter, render_document};
use crate::domain::slug::check_slug;
use crate::domain::types::{ContentFormat, MappingSource};

/// Slug → presence, in slug order.
pub type ContentMapping = BTreeMap<String, ContentMappingEntry>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Imported { article: ArticleRecord },
    Skipped { slug: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub slug: String,
    pub path: String,
    pub format: ContentFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub synced: usize,
    pub message: String,
}

pub struct ContentBridge {
    client: Arc<ContentClient>,
    content: Arc<dyn ContentSource>,
}

impl ContentBridge {
    pub fn new(client: Arc<ContentClient>, content: Arc<dyn ContentSource>) -> Self {
        Self { client, content }
    }

    pub fn content_source(&self) -> Arc<dyn ContentSource> {
        self.content.clone()
    }

    /// Where each known slug currently lives.
    pub async fn content_mapping(&self) -> Result<ContentMapping, AppError> {
        let (entries, articles) =
            try_join!(self.list_entries(), self.client.list_articles_strict())?;
        Ok(build_mapping(&entries, &articles))
    }

    /// Mapping entries in slug order.
    pub async fn all_articles(&self) -> Result<Vec<ContentMappingEntry>, AppError> {
        Ok(self.content_mapping().await?.into_values().collect())
    }

    /// Create a database row for the content file with `slug`.
    ///
    /// A slug that already has a row is skipped rather than duplicated.
    pub async fn import(&self, slug: &str) -> Result<ImportOutcome, AppError> {
        let entry = self
            .content
            .find_entry(slug)
            .await
            .map_err(AppError::from_repo("content file", slug))?
            .ok_or_else(|| AppError::not_found("content file", slug))?;

        let articles = self.client.list_articles_strict().await?;
        if articles.iter().any(|article| article.slug == entry.slug) {
            info!(target: "folio::import", slug, "slug already in database; skipping");
            return Ok(ImportOutcome::Skipped {
                slug: entry.slug,
                message: "Already exists in database".to_string(),
            });
        }

        let article = self
            .client
            .create_article(entry.to_new_article(OffsetDateTime::now_utc()))
            .await?;
        info!(target: "folio::import", slug = %article.slug, id = %article.id, "content file imported");
        Ok(ImportOutcome::Imported { article })
    }

    /// Import every content file missing from the database; one result per file.
    pub async fn import_all(&self) -> Result<Vec<BatchItemResult>, AppError> {
        let (entries, articles) =
            try_join!(self.list_entries(), self.client.list_articles_strict())?;
        let mut known: HashSet<String> = articles.into_iter().map(|a| a.slug).collect();
        let now = OffsetDateTime::now_utc();

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            if known.contains(&entry.slug) {
                results.push(BatchItemResult::skipped(
                    &entry.slug,
                    "Already exists in database",
                ));
                continue;
            }

            match self.client.create_article(entry.to_new_article(now)).await {
                Ok(_) => {
                    known.insert(entry.slug.clone());
                    results.push(BatchItemResult::success(&entry.slug, "Imported successfully"));
                }
                Err(err) => {
                    warn!(target: "folio::import", slug = %entry.slug, error = %err, "import failed");
                    results.push(BatchItemResult::error(&entry.slug, err.to_string()));
                }
            }
        }

        log_batch("folio::import", &results);
        Ok(results)
    }

    /// Write the database row with `slug` to the content directory.
    pub async fn export(&self, slug: &str) -> Result<ExportedFile, AppError> {
        let articles = self.client.list_articles_strict().await?;
        let article = articles
            .iter()
            .find(|article| article.slug == slug)
            .ok_or_else(|| AppError::not_found("article", slug))?;
        self.export_article(article).await
    }

    /// Export every database row; one result per row.
    pub async fn export_all(&self) -> Result<Vec<BatchItemResult>, AppError> {
        let articles = self.client.list_articles_strict().await?;
        let mut results = Vec::with_capacity(articles.len());
        for article in &articles {
            match self.export_article(article).await {
                Ok(file) => results.push(
                    BatchItemResult::success(&article.slug, "Exported successfully")
                        .with_path(file.path),
                ),
                Err(err) => {
                    warn!(target: "folio::export", slug = %article.slug, error = %err, "export failed");
                    results.push(BatchItemResult::error(&article.slug, err.to_string()));
                }
            }
        }

        log_batch("folio::export", &results);
        Ok(results)
    }

    /// Create rows for every content file not yet in the database.
    ///
    /// Stops at the first failed create; rows created before it are kept.
    pub async fn sync(&self) -> Result<SyncSummary, AppError> {
        let (entries, articles) =
            try_join!(self.list_entries(), self.client.list_articles_strict())?;
        let mut known: HashSet<String> = articles.into_iter().map(|a| a.slug).collect();
        let now = OffsetDateTime::now_utc();

        let mut synced = 0;
        for entry in &entries {
            if known.contains(&entry.slug) {
                continue;
            }
            self.client.create_article(entry.to_new_article(now)).await?;
            known.insert(entry.slug.clone());
            synced += 1;
        }

        let message = format!("Synced {synced} content files to database");
        info!(target: "folio::sync", synced, "{message}");
        Ok(SyncSummary { synced, message })
    }

    async fn export_article(&self, article: &ArticleRecord) -> Result<ExportedFile, AppError> {
        check_slug(&article.slug)?;

        let frontmatter = Frontmatter::from_article(article);
        let document = render_document(&frontmatter, &article.content);
        let format = ContentFormat::for_body(&article.content);

        let path = self
            .content
            .write_entry(&article.slug, format, &document)
            .await
            .map_err(AppError::from_repo("content file", &article.slug))?;

        info!(target: "folio::export", slug = %article.slug, path = %path, "article exported");
        Ok(ExportedFile {
            slug: article.slug.clone(),
            path,
            format,
        })
    }

    async fn list_entries(&self) -> Result<Vec<ContentFileEntry>, AppError> {
        self.content
            .list_entries()
            .await
            .map_err(AppError::from_repo("content directory", "*"))
    }
}

/// One pass over the files, one over the rows.
///
/// Titles come from the content file when both sides have the slug.
pub fn build_mapping(entries: &[ContentFileEntry], articles: &[ArticleRecord]) -> ContentMapping {
    let mut mapping = ContentMapping::new();
    for entry in entries {
        mapping.insert(
            entry.slug.clone(),
            ContentMappingEntry {
                content_id: Some(entry.id.clone()),
                db_id: None,
                title: entry.frontmatter.title.clone(),
                slug: entry.slug.clone(),
                source: MappingSource::Content,
            },
        );
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(articles.len());
    for article in articles {
        if !seen.insert(article.slug.as_str()) {
            continue;
        }
        match mapping.get_mut(&article.slug) {
            Some(existing) => {
                existing.db_id = Some(article.id.clone());
                existing.source = MappingSource::Both;
            }
            None => {
                mapping.insert(
                    article.slug.clone(),
                    ContentMappingEntry {
                        content_id: None,
                        db_id: Some(article.id.clone()),
                        title: article.title.clone(),
                        slug: article.slug.clone(),
                        source: MappingSource::Database,
                    },
                );
            }
        }
    }
    mapping
}

fn log_batch(target: &'static str, results: &[BatchItemResult]) {
    let summary = BatchSummary::from_results(results);
    if summary.is_partial_failure() {
        warn!(
            target: "folio::bridge",
            batch = target,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch finished with failures"
        );
    } else {
        info!(
            target: "folio::bridge",
            batch = target,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            "batch finished"
        );
    }
}
