//! Shared domain enumerations aligned with the remote article schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
}

impl ArticleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            other => Err(DomainError::validation(format!(
                "unknown article status `{other}`"
            ))),
        }
    }
}

/// Where a slug is currently present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    Content,
    Database,
    Both,
}

/// File flavour of a content entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Md,
    Mdx,
}

impl ContentFormat {
    /// Pick the extension for an exported body.
    ///
    /// Plain substring match on `import`/`export`: prose mentioning either word
    /// is written as `.mdx` too.
    pub fn for_body(body: &str) -> Self {
        if body.contains("import") || body.contains("export") {
            ContentFormat::Mdx
        } else {
            ContentFormat::Md
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ContentFormat::Md => "md",
            ContentFormat::Mdx => "mdx",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(ContentFormat::Md),
            "mdx" => Some(ContentFormat::Mdx),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            ContentFormat::Md => ContentFormat::Mdx,
            ContentFormat::Mdx => ContentFormat::Md,
        }
    }
}

/// Outcome of one item inside a batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Success,
    Skipped,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_lowercase_names() {
        assert_eq!(
            "published".parse::<ArticleStatus>().expect("status"),
            ArticleStatus::Published
        );
        assert!("archived".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn format_heuristic_matches_keywords_anywhere() {
        assert_eq!(ContentFormat::for_body("# Plain post"), ContentFormat::Md);
        assert_eq!(
            ContentFormat::for_body("import Chart from './Chart.astro'"),
            ContentFormat::Mdx
        );
        // Prose triggers the heuristic as well.
        assert_eq!(
            ContentFormat::for_body("We export reports weekly."),
            ContentFormat::Mdx
        );
    }
}
