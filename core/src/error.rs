//! Error types for the WordPress REST client.
//!
//! # Design
//! Every operation returns `Result<T, ApiError>`. A response whose status
//! differs from the one the operation expects lands in `UnexpectedStatus`
//! with the raw status code and body, so callers can tell "nothing there"
//! apart from "the request failed" and inspect the remote error envelope.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `WpClient` operations and the `build_*` / `parse_*`
/// helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The credential exchange failed or its response carried no token.
    #[error("authentication failed{}: {message}", status_suffix(status))]
    Authentication { status: Option<u16>, message: String },

    /// The server answered with a status other than the one expected.
    #[error("unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body was not valid JSON or lacked required fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The caller supplied an entity that cannot be sent as-is.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request could not be delivered (DNS, connection refused, TLS...).
    #[error("transport error: {0}")]
    Transport(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ApiError {
    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::Authentication { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The `code` field of the remote error envelope, e.g. `term_exists`.
    ///
    /// WordPress reports failures as `{"code": ..., "message": ..., "data": {...}}`;
    /// returns `None` when the body is not shaped that way.
    pub fn remote_code(&self) -> Option<String> {
        let ApiError::UnexpectedStatus { body, .. } = self else {
            return None;
        };
        let envelope: serde_json::Value = serde_json::from_str(body).ok()?;
        envelope.get("code")?.as_str().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_code_reads_wordpress_envelope() {
        let err = ApiError::UnexpectedStatus {
            status: 400,
            body: r#"{"code":"term_exists","message":"A term with the name provided already exists.","data":{"status":400,"term_id":7}}"#.to_string(),
        };
        assert_eq!(err.remote_code().as_deref(), Some("term_exists"));
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_not_found());
    }

    #[test]
    fn remote_code_is_none_for_plain_body() {
        let err = ApiError::UnexpectedStatus {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert!(err.remote_code().is_none());
    }

    #[test]
    fn authentication_display_includes_status() {
        let err = ApiError::Authentication {
            status: Some(403),
            message: "incorrect password".to_string(),
        };
        assert_eq!(err.to_string(), "authentication failed (HTTP 403): incorrect password");

        let err = ApiError::Authentication {
            status: None,
            message: "missing token".to_string(),
        };
        assert_eq!(err.to_string(), "authentication failed: missing token");
    }
}
