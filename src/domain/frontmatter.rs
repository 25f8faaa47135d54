//! Frontmatter parsing and rendering for markdown content files.
//!
//! Files start with a `---` line, followed by a YAML block, a closing `---`
//! line and the markdown body. Parsing goes through `serde_yaml`; rendering is
//! done by hand so exported files are byte-stable: every string is written as a
//! double-quoted scalar and tags as a flow sequence.

use std::fmt::Write as _;

use serde::{Deserialize, Deserializer, de};
use time::{
    Date, OffsetDateTime,
    format_description::{FormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::domain::{entities::ArticleRecord, error::DomainError, slug::derive_slug};

const DELIMITER: &str = "---";
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Metadata block of a content file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "content_date")]
    pub pub_date: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "content_date")]
    pub updated_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    /// Overrides the slug derived from the file name.
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Frontmatter {
    /// Project an article row onto frontmatter fields.
    ///
    /// `updatedDate` is only emitted when it differs from `created_at`, and an
    /// explicit `slug` only when the file name would not reproduce it.
    pub fn from_article(article: &ArticleRecord) -> Self {
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());

        let slug_override = match derive_slug(&article.slug) {
            Ok(derived) if derived == article.slug => None,
            _ => Some(article.slug.clone()),
        };

        Self {
            title: article.title.clone(),
            description: non_empty(&article.description),
            pub_date: Some(article.created_at),
            updated_date: (article.updated_at != article.created_at).then_some(article.updated_at),
            cover_image: non_empty(&article.cover_image),
            author: non_empty(&article.author_name).map(|name| Author { name, image: None }),
            tags: article.tags.clone(),
            featured: false,
            slug: slug_override,
        }
    }
}

/// Split a content file into frontmatter and body.
///
/// Blank lines between the closing delimiter and the body are dropped.
pub fn parse_document(file: &str, raw: &str) -> Result<(Frontmatter, String), DomainError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text.split_inclusive('\n');

    let opening = lines.next().unwrap_or_default();
    if opening.trim_end() != DELIMITER {
        return Err(DomainError::frontmatter(
            file,
            "missing opening `---` delimiter",
        ));
    }

    let mut offset = opening.len();
    let mut yaml = String::new();
    let mut closed = false;
    for line in lines {
        offset += line.len();
        if line.trim_end() == DELIMITER {
            closed = true;
            break;
        }
        yaml.push_str(line);
    }

    if !closed {
        return Err(DomainError::frontmatter(
            file,
            "missing closing `---` delimiter",
        ));
    }

    let frontmatter: Frontmatter = serde_yaml::from_str(&yaml)
        .map_err(|err| DomainError::frontmatter(file, err.to_string()))?;
    if frontmatter.title.trim().is_empty() {
        return Err(DomainError::frontmatter(file, "`title` must not be empty"));
    }

    let body = text[offset..].trim_start_matches(['\r', '\n']).to_string();
    Ok((frontmatter, body))
}

/// Render frontmatter and body into the on-disk document.
pub fn render_document(frontmatter: &Frontmatter, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(DELIMITER);
    out.push('\n');

    push_string(&mut out, "title", &frontmatter.title);
    if let Some(description) = &frontmatter.description {
        push_string(&mut out, "description", description);
    }
    if let Some(slug) = &frontmatter.slug {
        push_string(&mut out, "slug", slug);
    }
    if let Some(pub_date) = frontmatter.pub_date {
        push_string(&mut out, "pubDate", &format_content_date(pub_date));
    }
    if let Some(updated_date) = frontmatter.updated_date {
        push_string(&mut out, "updatedDate", &format_content_date(updated_date));
    }
    if let Some(cover_image) = &frontmatter.cover_image {
        push_string(&mut out, "coverImage", cover_image);
    }
    if let Some(author) = &frontmatter.author {
        out.push_str("author:\n");
        let _ = writeln!(out, "  name: {}", quote(&author.name));
        if let Some(image) = &author.image {
            let _ = writeln!(out, "  image: {}", quote(image));
        }
    }
    if !frontmatter.tags.is_empty() {
        let tags = frontmatter
            .tags
            .iter()
            .map(|tag| quote(tag))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(out, "tags: [{tags}]");
    }
    if frontmatter.featured {
        out.push_str("featured: true\n");
    }

    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(body);
    out
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_content_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(timestamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(timestamp);
    }
    Date::parse(value, DATE_FORMAT)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Render the calendar date of a timestamp as `YYYY-MM-DD`.
pub fn format_content_date(timestamp: OffsetDateTime) -> String {
    let date = timestamp.date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn push_string(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{key}: {}", quote(value));
}

// JSON string escapes are a subset of YAML double-quoted escapes.
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

fn content_date<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_content_date(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date `{raw}`"))),
    }
}
