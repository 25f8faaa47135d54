//! Adapter for a hosted Supabase project: PostgREST for the `articles` table
//! and the Storage API for buckets.

mod articles;
mod storage;

use std::time::Duration;

use metrics::counter;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::application::repos::RepoError;
use crate::config::RemoteCredentials;
use crate::infra::error::InfraError;

const METRIC_REMOTE_REQUEST: &str = "folio_remote_request_total";

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base: Url,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(credentials: &RemoteCredentials, timeout: Duration) -> Result<Self, InfraError> {
        if credentials.url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "remote url `{}` cannot be used as a base url",
                credentials.url
            )));
        }
        let http = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base: credentials.url.clone(),
            anon_key: credentials.anon_key.clone(),
        })
    }

    /// `base` joined with `segments`; each segment may itself contain `/`.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|part| !part.is_empty()));
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn send(&self, api: &'static str, request: RequestBuilder) -> Result<Response, RepoError> {
        let response = request.send().await.map_err(|err| {
            counter!(METRIC_REMOTE_REQUEST, "api" => api, "outcome" => "transport_error")
                .increment(1);
            RepoError::unavailable(err)
        })?;

        let status = response.status();
        let outcome = if status.is_success() { "ok" } else { "error" };
        counter!(METRIC_REMOTE_REQUEST, "api" => api, "outcome" => outcome).increment(1);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, RepoError> {
        let bytes = response.bytes().await.map_err(RepoError::unavailable)?;
        serde_json::from_slice(&bytes).map_err(|err| {
            RepoError::rejected(
                StatusCode::OK.as_u16(),
                format!("unexpected response body: {err}"),
            )
        })
    }
}

/// Translate a non-success response into a repository error.
///
/// The Storage API reports missing objects as `400` with `"statusCode": "404"`
/// in the body, so the body is consulted as well.
fn classify(status: StatusCode, body: &str) -> RepoError {
    let message = error_message(body);
    if status == StatusCode::NOT_FOUND || body_says_not_found(body) {
        return RepoError::NotFound;
    }
    if status.is_server_error()
        || matches!(
            status,
            StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::REQUEST_TIMEOUT
                | StatusCode::TOO_MANY_REQUESTS
        )
    {
        return RepoError::Unavailable(format!("status {status}: {message}"));
    }
    RepoError::rejected(status.as_u16(), message)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error", "msg"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn body_says_not_found(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("statusCode")
                .map(|code| code.as_str() == Some("404") || code.as_u64() == Some(404))
        })
        .unwrap_or(false)
}
