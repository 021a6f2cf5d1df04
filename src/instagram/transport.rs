use futures::StreamExt;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors raised by the HTTP transport.
///
/// A non-2xx response keeps its decoded body so callers can inspect the
/// platform's error payload (see [`TransportError::HttpStatus`]).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status code.
    /// `body` is the decoded JSON error body, or `Value::Null` if it wasn't JSON.
    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16, body: Value },
    /// 2xx response whose body is not valid JSON
    #[error("Invalid JSON response: {0}")]
    Decode(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl TransportError {
    /// Decoded error body for HTTP status failures.
    pub fn body(&self) -> Option<&Value> {
        match self {
            TransportError::HttpStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// JSON-over-HTTP boundary the Instagram client is written against.
///
/// Implementations decode successful bodies as JSON and turn any non-2xx
/// response into [`TransportError::HttpStatus`] carrying the decoded body.
pub trait Transport: Send + Sync {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, TransportError> {
        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(TransportError::Network)?;

        let status = response.status();
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        if !status.is_success() {
            // Error bodies that aren't JSON are still reported, just without a payload
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            tracing::warn!(status = status.as_u16(), "Instagram API returned an error status");
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        tracing::debug!(url = %redact_token(url), "GET");
        self.send(self.client.get(url)).await
    }

    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError> {
        tracing::debug!(url = %url, fields = fields.len(), "POST");
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        let request = self
            .client
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body);
        self.send(request).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, TransportError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(TransportError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(TransportError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(TransportError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Masks the `access_token` / `client_secret` query values so URLs can be logged.
fn redact_token(url: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(url) else {
        return "[unparseable url]".to_string();
    };
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" || k == "client_secret" {
                "[REDACTED]".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return parsed.to_string();
    }
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
