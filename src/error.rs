//! Console error types with HTTP status code mapping.
//!
//! [`ConsoleError`] is the central error type for the console core. Broker,
//! HTTP-collaborator and status-API failures all flow through it; capture
//! failures have their own [`CaptureError`] so the capture loop can tell a
//! fatal acquisition failure from a per-tick draw failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "camera not found: cam-7",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failures raised by the capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The capture source could not be acquired (missing device, denied
    /// permission, empty directory).
    #[error("unable to access capture source: {0}")]
    Acquire(String),

    /// A frame could not be read from an acquired source.
    #[error("frame read failed: {0}")]
    Read(String),

    /// Drawing a frame or annotation onto the render sink failed.
    #[error("render failed: {0}")]
    Render(String),

    /// The requested lifecycle transition is not valid from the current state.
    #[error("invalid capture transition: {0}")]
    InvalidState(String),
}

/// Central error enum for the console.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Upstream        | 502 Bad Gateway            |
/// | 4000–4999 | Capture         | 409 Conflict / 503         |
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Broker transport failure (connect, send or receive).
    #[error("broker transport error: {0}")]
    Transport(String),

    /// A broker connection attempt exceeded the configured timeout.
    #[error("broker connect timed out after {timeout_ms} ms")]
    ConnectTimeout {
        /// Timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// An inbound payload could not be decoded or failed validation.
    #[error("malformed payload on {topic}: {reason}")]
    Decode {
        /// Topic the payload arrived on.
        topic: String,
        /// Why decoding failed.
        reason: String,
    },

    /// An outbound payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP collaborator request failed at the transport level.
    #[error("http collaborator error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP collaborator answered with a non-success status.
    #[error("http collaborator returned {status} for {path}")]
    UnexpectedStatus {
        /// Request path.
        path: String,
        /// HTTP status code returned.
        status: u16,
    },

    /// Camera with the given id is not known to the store.
    #[error("camera not found: {0}")]
    CameraNotFound(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Capture pipeline failure.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// A background task or channel the operation depends on is gone.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Decode { .. } => 1002,
            Self::Serialization(_) => 1003,
            Self::CameraNotFound(_) => 2001,
            Self::Transport(_) => 3001,
            Self::ConnectTimeout { .. } => 3002,
            Self::Http(_) => 3003,
            Self::UnexpectedStatus { .. } => 3004,
            Self::Capture(CaptureError::InvalidState(_)) => 4001,
            Self::Capture(_) => 4002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Decode { .. } | Self::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::CameraNotFound(_) => StatusCode::NOT_FOUND,
            Self::Transport(_)
            | Self::ConnectTimeout { .. }
            | Self::Http(_)
            | Self::UnexpectedStatus { .. } => StatusCode::BAD_GATEWAY,
            Self::Capture(CaptureError::InvalidState(_)) => StatusCode::CONFLICT,
            Self::Capture(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn capture_errors_keep_user_visible_message() {
        let err = ConsoleError::from(CaptureError::Acquire("permission denied".to_string()));
        assert_eq!(
            err.to_string(),
            "unable to access capture source: permission denied"
        );
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invalid_capture_transition_is_conflict() {
        let err = ConsoleError::from(CaptureError::InvalidState("already streaming".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 4001);
    }

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let err = ConsoleError::UnexpectedStatus {
            path: "/api/cameras".to_string(),
            status: 503,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("/api/cameras"));
    }

    #[test]
    fn into_response_sets_status() {
        let response = ConsoleError::CameraNotFound("cam-1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
