//! HTTP JSON query client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use gitsdk_core::{Error, Result};

const USER_AGENT: &str = concat!("gitsdk/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client.
///
/// # Panics
///
/// `Client::builder().build()` only fails on a broken TLS backend or an
/// invalid proxy configuration, neither of which can happen with these
/// settings; a panic here indicates a fundamental environment issue.
#[must_use]
#[allow(clippy::expect_used)]
pub fn default_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client - TLS backend initialization failed")
}

/// Issue one GET for `url` and parse the 200 response body as JSON.
///
/// The body is buffered in full before parsing. No retries, no timeout
/// enforcement; both are the caller's responsibility.
///
/// # Errors
///
/// [`Error::HttpStatus`] on a non-200 response, [`Error::Transport`] on a
/// network-level failure, [`Error::Json`] when the body does not parse
/// into `T`.
pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    debug!(%url, "Querying build service");

    let response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(Error::http_status(
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        ));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::json(url, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Payload {
        count: u64,
    }

    #[tokio::test]
    async fn parses_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"count": 3}"#))
            .mount(&server)
            .await;

        let payload: Payload = fetch_json(&default_client(), &format!("{}/builds", server.uri()))
            .await
            .unwrap();
        assert_eq!(payload.count, 3);
    }

    #[tokio::test]
    async fn non_200_becomes_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/builds"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/builds", server.uri());
        let err = fetch_json::<Payload>(&default_client(), &url)
            .await
            .unwrap_err();

        match err {
            Error::HttpStatus { url: u, status, .. } => {
                assert_eq!(u, url);
                assert_eq!(status, 503);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_becomes_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = fetch_json::<Payload>(&default_client(), &format!("{}/builds", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }
}
