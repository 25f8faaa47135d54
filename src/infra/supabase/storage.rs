use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode, multipart};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::application::repos::{BlobMetadata, BlobStore, BlobUpload, BucketSpec, RepoError};
use crate::domain::entities::BlobObject;

use super::SupabaseClient;

const STORAGE: &str = "storage/v1";
const API: &str = "storage";
const LIST_LIMIT: u32 = 1000;
const CACHE_CONTROL_SECS: &str = "3600";

#[derive(Debug, Serialize)]
struct CreateBucket<'a> {
    id: &'a str,
    name: &'a str,
    public: bool,
    allowed_mime_types: &'a [String],
    file_size_limit: u64,
}

#[derive(Debug, Deserialize)]
struct SignedUrl {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

#[derive(Debug, Deserialize)]
struct ObjectInfo {
    #[serde(default)]
    user_metadata: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, Value>>,
}

fn flatten_metadata(map: serde_json::Map<String, Value>) -> BlobMetadata {
    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => (key, text),
            other => (key, other.to_string()),
        })
        .collect()
}

#[async_trait]
impl BlobStore for SupabaseClient {
    async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<bool, RepoError> {
        let lookup = self.request(
            Method::GET,
            self.endpoint(&[STORAGE, "bucket", &spec.name]),
        );
        match self.send(API, lookup).await {
            Ok(_) => return Ok(false),
            Err(RepoError::NotFound) => {}
            Err(err) => return Err(err),
        }

        let body = CreateBucket {
            id: &spec.name,
            name: &spec.name,
            public: spec.public,
            allowed_mime_types: &spec.allowed_mime_types,
            file_size_limit: spec.file_size_limit,
        };
        let create = self
            .request(Method::POST, self.endpoint(&[STORAGE, "bucket"]))
            .json(&body);
        match self.send(API, create).await {
            Ok(_) => Ok(true),
            // Created concurrently by someone else.
            Err(RepoError::Rejected { status, message })
                if status == StatusCode::CONFLICT.as_u16()
                    || message.to_ascii_lowercase().contains("already exists") =>
            {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        upload: BlobUpload,
    ) -> Result<(), RepoError> {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let part = multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(file_name)
            .mime_str(&upload.content_type)
            .map_err(|err| {
                RepoError::rejected(
                    StatusCode::BAD_REQUEST.as_u16(),
                    format!("invalid content type `{}`: {err}", upload.content_type),
                )
            })?;

        let mut form = multipart::Form::new().text("cacheControl", CACHE_CONTROL_SECS);
        if !upload.metadata.is_empty() {
            let metadata = serde_json::to_string(&upload.metadata).map_err(|err| {
                RepoError::rejected(StatusCode::BAD_REQUEST.as_u16(), err.to_string())
            })?;
            form = form.text("metadata", metadata);
        }
        let form = form.part("", part);

        let request = self
            .request(Method::POST, self.endpoint(&[STORAGE, "object", bucket, path]))
            .header("x-upsert", if upload.upsert { "true" } else { "false" })
            .multipart(form);
        self.send(API, request).await?;
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, RepoError> {
        let request = self.request(
            Method::GET,
            self.endpoint(&[STORAGE, "object", bucket, path]),
        );
        let response = self.send(API, request).await?;
        response.bytes().await.map_err(RepoError::unavailable)
    }

    async fn metadata(&self, bucket: &str, path: &str) -> Result<BlobMetadata, RepoError> {
        let request = self.request(
            Method::GET,
            self.endpoint(&[STORAGE, "object", "info", bucket, path]),
        );
        let response = self.send(API, request).await?;
        let info: ObjectInfo = Self::json(response).await?;
        Ok(info
            .user_metadata
            .or(info.metadata)
            .map(flatten_metadata)
            .unwrap_or_default())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobObject>, RepoError> {
        let body = json!({
            "prefix": prefix.trim_matches('/'),
            "limit": LIST_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });
        let request = self
            .request(Method::POST, self.endpoint(&[STORAGE, "object", "list", bucket]))
            .json(&body);
        let response = self.send(API, request).await?;
        Self::json(response).await
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), RepoError> {
        let request = self
            .request(Method::DELETE, self.endpoint(&[STORAGE, "object", bucket]))
            .json(&json!({ "prefixes": paths }));
        self.send(API, request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&[STORAGE, "object", "public", bucket, path])
            .to_string()
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: Duration,
    ) -> Result<String, RepoError> {
        let request = self
            .request(Method::POST, self.endpoint(&[STORAGE, "object", "sign", bucket, path]))
            .json(&json!({ "expiresIn": expires_in.as_secs() }));
        let response = self.send(API, request).await?;
        let signed: SignedUrl = Self::json(response).await?;

        // The API answers with a path relative to `/storage/v1`.
        let mut url = self.endpoint(&[STORAGE]).to_string();
        url.push_str(&signed.signed_url);
        Ok(url)
    }
}
