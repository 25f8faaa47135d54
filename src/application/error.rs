use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    application::repos::RepoError, domain::error::DomainError, infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} `{key}` not found")]
    NotFound { entity: &'static str, key: String },
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Build a mapper that translates a repository error about `entity`/`key`.
    pub fn from_repo(
        entity: &'static str,
        key: &str,
    ) -> impl FnOnce(RepoError) -> AppError + use<> {
        let key = key.to_string();
        move |err| match err {
            RepoError::NotFound => AppError::NotFound { entity, key },
            RepoError::Unavailable(message) => AppError::RemoteUnavailable(message),
            RepoError::Rejected { status, message } => {
                AppError::Validation(format!("{entity} `{key}` rejected ({status}): {message}"))
            }
            RepoError::Io(err) => AppError::Infra(InfraError::Io(err)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::Domain(DomainError::Validation { .. })
        )
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, AppError::RemoteUnavailable(_))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// Every failure is answered with `500 {"message": ...}`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let body = ErrorBody {
            message: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}
