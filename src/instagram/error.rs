use super::transport::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Error type reported by the platform when a token is expired or revoked.
pub const BAD_TOKEN_ERROR_TYPE: &str = "OAuthAccessTokenException";

/// Errors surfaced by [`InstagramClient`](super::InstagramClient).
#[derive(Debug, Error)]
pub enum InstagramError {
    /// The access token is invalid or revoked; the user must re-authenticate.
    #[error("The token is invalid")]
    BadToken,
    /// Any other transport failure, unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A 2xx response did not have the expected shape.
    #[error("Unexpected response payload: {0}")]
    Decode(String),
    /// An access token was constructed with an empty field.
    #[error("Invalid access token: {0}")]
    InvalidToken(&'static str),
    /// The user declined authorization on the callback.
    #[error("Authorization denied: {0}")]
    AuthDenied(String),
    /// The callback `state` did not match the expected CSRF token.
    #[error("OAuth state mismatch")]
    StateMismatch,
}

impl InstagramError {
    /// Reclassifies a transport failure, mapping platform token errors to
    /// [`InstagramError::BadToken`] and passing everything else through.
    pub fn classify(err: TransportError) -> Self {
        match err.body() {
            Some(body) if is_bad_token_body(body) => InstagramError::BadToken,
            _ => InstagramError::Transport(err),
        }
    }
}

/// Only `meta.error_type` identifies a bad token; other error shapes pass through.
fn is_bad_token_body(body: &Value) -> bool {
    body.pointer("/meta/error_type").and_then(Value::as_str) == Some(BAD_TOKEN_ERROR_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http_error(body: Value) -> TransportError {
        TransportError::HttpStatus { status: 400, body }
    }

    #[test]
    fn test_meta_error_type_is_bad_token() {
        let err = InstagramError::classify(http_error(json!({
            "meta": {"error_type": "OAuthAccessTokenException", "code": 400}
        })));
        assert!(matches!(err, InstagramError::BadToken));
    }

    #[test]
    fn test_graph_error_shape_passes_through() {
        let body = json!({"error": {"type": "OAuthAccessTokenException", "code": 190}});
        let err = InstagramError::classify(http_error(body.clone()));
        match err {
            InstagramError::Transport(TransportError::HttpStatus { status, body: kept }) => {
                assert_eq!(status, 400);
                assert_eq!(kept, body);
            }
            e => panic!("Expected Transport(HttpStatus), got {:?}", e),
        }
    }

    #[test]
    fn test_other_error_type_passes_through() {
        let err = InstagramError::classify(http_error(json!({
            "meta": {"error_type": "APIRequestsLimitException"}
        })));
        match err {
            InstagramError::Transport(TransportError::HttpStatus { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body["meta"]["error_type"], "APIRequestsLimitException");
            }
            e => panic!("Expected Transport(HttpStatus), got {:?}", e),
        }
    }

    #[test]
    fn test_missing_error_type_passes_through() {
        let err = InstagramError::classify(http_error(Value::Null));
        assert!(matches!(
            err,
            InstagramError::Transport(TransportError::HttpStatus { .. })
        ));

        let err = InstagramError::classify(TransportError::Timeout);
        assert!(matches!(
            err,
            InstagramError::Transport(TransportError::Timeout)
        ));
    }
}
