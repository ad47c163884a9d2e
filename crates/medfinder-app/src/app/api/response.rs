//! JSON response envelope shared by every route.

use salvo::http::StatusCode;
use salvo::writing::Json;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// ## Summary
/// Renders `{"status": "success", "message", "data"}`.
pub fn render_success<T: Serialize + Send>(
    res: &mut salvo::Response,
    status: StatusCode,
    message: &str,
    data: T,
) {
    res.status_code(status);
    res.render(Json(Envelope {
        status: "success",
        message: message.to_string(),
        data: Some(data),
    }));
}

/// ## Summary
/// Renders `{"status": "fail" | "error", "message"}` for an error.
///
/// Server-side errors are logged with their internal detail; the body only
/// carries the public message.
pub fn render_error(res: &mut salvo::Response, err: &AppError) {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(error = %err, status = status.as_u16(), "Request failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "Request rejected");
    }

    res.status_code(status);
    res.render(Json(Envelope::<()> {
        status: if status.is_server_error() { "error" } else { "fail" },
        message: err.public_message(),
        data: None,
    }));
}
