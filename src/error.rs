use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{auth::AuthError, store::StoreError};

/// ApiError
///
/// Every failure an HTTP caller can observe. Module errors convert into this type
/// so handlers can use `?` and let `IntoResponse` pick the status code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No credential, or the credential could not be verified.
    #[error("authentication required")]
    Unauthenticated,
    /// Valid credential, wrong role for this route.
    #[error("insufficient role for this operation")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    /// Login rejected. Kept generic so the caller learns nothing about why.
    #[error("invalid credential")]
    InvalidCredential,
}

/// ErrorBody
///
/// JSON payload of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `not_found`.
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Forbidden => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::InvalidCredential => "invalid_credential",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        let mut response = (self.status(), Json(body)).into_response();
        if self == ApiError::Unauthenticated {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => ApiError::NotFound(message),
            StoreError::Validation(message) => ApiError::Validation(message),
        }
    }
}

impl From<AuthError> for ApiError {
    // Guard-side mapping: any failure to establish who the caller is reads as unauthenticated.
    fn from(_: AuthError) -> Self {
        ApiError::Unauthenticated
    }
}

impl From<JsonRejection> for ApiError {
    // Missing fields, wrong types, non-JSON bodies and a wrong content type all read as bad input.
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
