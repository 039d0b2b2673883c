use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use b2b_core::errors::B2BError;

/// Handler error: renders any `anyhow::Error` as a structured JSON body.
#[derive(Debug)]
pub struct B2BAxumError(pub anyhow::Error);

impl From<anyhow::Error> for B2BAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<B2BError> for B2BAxumError {
    fn from(e: B2BError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for B2BAxumError {
    fn into_response(self) -> Response {
        let safe = match B2BError::find(&self.0) {
            Some(err) => err.sanitize_for_client(),
            None => {
                tracing::error!(error = %self.0, "unhandled service error");
                B2BError::general_error(self.0.to_string())
            }
        };

        let status =
            StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
