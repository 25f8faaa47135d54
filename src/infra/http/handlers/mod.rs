//! JSON handlers, one module per route group.
//!
//! Handlers decode the request, call a single application operation and
//! encode its result. Failures are rendered by [`AppError`]'s `IntoResponse`.
//!
//! [`AppError`]: crate::application::error::AppError

mod content;
mod media;
mod storage;

pub use content::*;
pub use media::*;
pub use storage::*;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;

use super::models::MessageResponse;

/// Reject a request whose body is missing required input.
fn bad_request(source: &'static str, message: &'static str) -> Response {
    let mut response = (StatusCode::BAD_REQUEST, Json(MessageResponse::new(message))).into_response();
    ErrorReport::from_message(source, StatusCode::BAD_REQUEST, message).attach(&mut response);
    response
}

pub async fn health() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
