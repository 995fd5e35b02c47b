use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

use crate::core::SourceError;

/// Scraped pages serve a stripped-down layout to unknown clients, so the
/// scrapers identify as a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const API_USER_AGENT: &str = concat!("adaconv/", env!("CARGO_PKG_VERSION"));

pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// GETs `url` and returns the body of a successful response.
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, SourceError> {
    debug!("Requesting price data from {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();
    debug!(%status, "Received response");
    if !status.is_success() {
        return Err(SourceError::HttpStatus(status));
    }

    Ok(response.text().await?)
}

/// Wiremock matcher for requests carrying [`BROWSER_USER_AGENT`].
#[cfg(test)]
pub(crate) fn has_browser_user_agent(request: &wiremock::Request) -> bool {
    request
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        == Some(BROWSER_USER_AGENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_text_sends_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(has_browser_user_agent)
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&mock_server)
            .await;

        let client = build_client(BROWSER_USER_AGENT, Duration::from_secs(5)).unwrap();
        let body = get_text(&client, &format!("{}/page", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_get_text_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = build_client(API_USER_AGENT, Duration::from_secs(5)).unwrap();
        let result = get_text(&client, &mock_server.uri()).await;
        assert!(matches!(
            result,
            Err(SourceError::HttpStatus(status)) if status.as_u16() == 503
        ));
    }

    #[tokio::test]
    async fn test_get_text_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("too late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = build_client(API_USER_AGENT, Duration::from_millis(200)).unwrap();
        let result = get_text(&client, &mock_server.uri()).await;
        assert!(matches!(result, Err(SourceError::Timeout)), "{result:?}");
    }

    #[tokio::test]
    async fn test_get_text_connection_refused() {
        let client = build_client(API_USER_AGENT, Duration::from_secs(1)).unwrap();
        let result = get_text(&client, "http://127.0.0.1:1/").await;
        assert!(matches!(result, Err(SourceError::Transport(_))), "{result:?}");
    }
}
