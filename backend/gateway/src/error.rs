//! Error responses for the gateway.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use inkcalc_core::CalcError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Error processing image: {0}")]
    Processing(String),

    #[error(transparent)]
    BadBody(#[from] JsonRejection),
}

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        match err {
            CalcError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            CalcError::Processing(msg) => ApiError::Processing(msg),
            other => ApiError::Processing(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadBody(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadBody(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_400() {
        let err = ApiError::from(CalcError::InvalidInput("malformed image data".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "malformed image data");
    }

    #[test]
    fn everything_else_maps_to_500() {
        let model = ApiError::from(CalcError::ModelService {
            provider: "gemini".into(),
            message: "timeout".into(),
        });
        assert_eq!(model.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(model.to_string().contains("timeout"));

        let processing = ApiError::from(CalcError::Processing("bad png".into()));
        assert_eq!(processing.to_string(), "Error processing image: bad png");
    }
}
