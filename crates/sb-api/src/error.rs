//! HTTP mapping for domain errors.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sb_core::error::AppError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Wraps [`AppError`] so it can be returned straight from a handler.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] AppError);

impl ApiError {
    pub fn inner(&self) -> &AppError {
        &self.0
    }
}

/// Store and adapter failures arrive as `anyhow::Error`; typed domain errors
/// inside them keep their meaning, anything else is an internal error.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => ApiError(app),
            Err(other) => {
                error!(error = %format!("{other:#}"), "Request failed");
                ApiError(AppError::Internal(other.to_string()))
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the logs.
        let message = match &self.0 {
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_error_survives_anyhow() {
        let wrapped: anyhow::Error = AppError::Conflict("username taken".into()).into();
        let api: ApiError = wrapped.into();
        assert_eq!(api.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_untyped_error_is_internal() {
        let api: ApiError = anyhow::anyhow!("disk I/O error").into();
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(api.inner(), AppError::Internal(_)));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("Post".into(), "1".into()), StatusCode::NOT_FOUND),
            (AppError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unprocessable("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }
}
