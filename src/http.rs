use crate::error::{Error, Result};
use reqwest::{Client, header};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Status and body of any HTTP response, successful or not.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound client. One attempt per call: callers decide what a failure
/// means, nothing here sleeps or retries.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::request(e.to_string()))?;

        Ok(Self { client })
    }

    /// POST `body` as JSON with a bearer token.
    ///
    /// Request-construction problems (invalid header value, bad URL) come
    /// back as [`Error::Request`]; connect/timeout/read failures as
    /// [`Error::Http`]. Any status code is a successful call.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        bearer: &str,
        body: &T,
    ) -> Result<RawResponse> {
        let payload =
            serde_json::to_vec(body).map_err(|e| Error::request(format!("serialize body: {e}")))?;

        let request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
            .body(payload)
            .build()
            .map_err(|e| Error::request(e.to_string()))?;

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| Error::http(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| Error::http(e.to_string()))?;
        debug!(status, bytes = body.len(), "response received");
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let ok = RawResponse {
            status: 204,
            body: String::new(),
        };
        let bad = RawResponse {
            status: 429,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }

    #[tokio::test]
    async fn invalid_bearer_is_a_request_error() {
        let http = HttpClient::new("test", Duration::from_secs(1)).unwrap();
        let err = http
            .post_json("http://localhost:1/x", "bad\nkey", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.is_structural(), "got {err}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let http = HttpClient::new("test", Duration::from_secs(1)).unwrap();
        let err = http
            .post_json("http://127.0.0.1:1/x", "key", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got {err}");
    }
}
