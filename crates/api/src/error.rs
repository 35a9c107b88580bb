//! Transport and HTTP status classification into the client error taxonomy.

use coincraft_core::error::ClientError;
use reqwest::StatusCode;

/// Classify a non-success HTTP status into a [`ClientError`].
///
/// `detail` is the backend's `detail` (or `message`) field when one could
/// be parsed from the error body.
///
/// - `401` maps to `Unauthorized` -- the caller treats the token as dead.
/// - `400`/`409` carry business rejections (insufficient balance,
///   duplicate account) and map to `Rejected`.
/// - `422` is a request-validation failure and maps to `Validation`.
/// - `5xx` is transient from the client's point of view and maps to
///   `Network` so callers offer a retry.
pub fn classify_status(status: StatusCode, detail: Option<String>) -> ClientError {
    let message = detail.unwrap_or_else(|| format!("HTTP {status}"));
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT => ClientError::Rejected(message),
        StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation(message),
        s if s.is_server_error() => ClientError::Network(message),
        _ => ClientError::Internal(message),
    }
}

/// Classify a reqwest transport error.
///
/// Body-decode failures are treated as malformed server payloads
/// (`Validation`), everything else as `Network`.
pub fn classify_transport(err: &reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::Validation(format!("Malformed server payload: {err}"))
    } else {
        ClientError::Network(err.to_string())
    }
}
