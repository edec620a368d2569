//! Custom Axum extractors for request authentication.
//!
//! Provides `AdminAuth`, which gates the administrative endpoints behind a
//! bearer token from the configuration.

use super::ErrorBody;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

/// An Axum extractor that verifies the `Authorization: Bearer …` header
/// against the configured admin token.
pub struct AdminAuth;

/// Errors returned by the [`AdminAuth`] extractor.
#[derive(Debug)]
pub enum AdminAuthError {
    MissingHeader,
    InvalidToken,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AdminAuthError::MissingHeader => "missing Authorization header",
            AdminAuthError::InvalidToken => "invalid admin token",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: message.to_owned(),
            }),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidToken)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AdminAuthError::InvalidToken)?;

        if token != state.admin_token.as_ref() {
            return Err(AdminAuthError::InvalidToken);
        }

        Ok(AdminAuth)
    }
}
