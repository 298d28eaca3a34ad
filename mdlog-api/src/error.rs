use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use mdlog_core::MdlogError;

/// Error returned from handlers. Rendered as the generic failure body; the
/// underlying error is only ever logged.
#[derive(Debug)]
pub struct ApiError(pub MdlogError);

impl From<MdlogError> for ApiError {
    fn from(e: MdlogError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            self.0.to_json_body(),
        )
            .into_response()
    }
}
