use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::application::repos::{ArticlesRepo, RepoError};
use crate::domain::entities::{ArticleRecord, ArticleUpdate, NewArticle};

use super::SupabaseClient;

const TABLE: &str = "rest/v1/articles";
const API: &str = "rest";

impl SupabaseClient {
    async fn select_one(&self, column: &str, value: &str) -> Result<Option<ArticleRecord>, RepoError> {
        let mut url = self.endpoint(&[TABLE]);
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair(column, &format!("eq.{value}"))
            .append_pair("limit", "1");

        let response = self.send(API, self.request(Method::GET, url)).await?;
        let rows: Vec<ArticleRecord> = Self::json(response).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl ArticlesRepo for SupabaseClient {
    async fn list_articles(&self) -> Result<Vec<ArticleRecord>, RepoError> {
        let mut url = self.endpoint(&[TABLE]);
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");

        let response = self.send(API, self.request(Method::GET, url)).await?;
        Self::json(response).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArticleRecord>, RepoError> {
        match self.select_one("id", id).await {
            // A key that is not a valid id for the column type (e.g. a slug
            // against a numeric id) is a miss, not a failure.
            Err(RepoError::Rejected { status, .. })
                if status == StatusCode::BAD_REQUEST.as_u16() =>
            {
                Ok(None)
            }
            other => other,
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>, RepoError> {
        self.select_one("slug", slug).await
    }

    async fn create_article(&self, article: &NewArticle) -> Result<ArticleRecord, RepoError> {
        let request = self
            .request(Method::POST, self.endpoint(&[TABLE]))
            .header("Prefer", "return=representation")
            .json(article);

        let response = self.send(API, request).await?;
        let rows: Vec<ArticleRecord> = Self::json(response).await?;
        rows.into_iter().next().ok_or_else(|| {
            RepoError::rejected(
                StatusCode::CREATED.as_u16(),
                "insert returned no representation",
            )
        })
    }

    async fn update_article(
        &self,
        id: &str,
        update: &ArticleUpdate,
    ) -> Result<ArticleRecord, RepoError> {
        let mut url = self.endpoint(&[TABLE]);
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(update);

        let response = self.send(API, request).await?;
        let rows: Vec<ArticleRecord> = Self::json(response).await?;
        rows.into_iter().next().ok_or(RepoError::NotFound)
    }

    async fn delete_article(&self, id: &str) -> Result<(), RepoError> {
        let mut url = self.endpoint(&[TABLE]);
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        self.send(API, self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
