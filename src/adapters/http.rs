//! Shared HTTP plumbing for the remote data sources

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::AdapterError;

/// Thin wrapper over `reqwest::Client` that maps upstream failures onto
/// `AdapterError` variants
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bioplan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<(StatusCode, String), AdapterError> {
        debug!(%url, "GET");
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// GET a non-empty text body
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, AdapterError> {
        self.get_text_optional(url, query)
            .await?
            .ok_or_else(|| AdapterError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            })
    }

    /// GET a text body, treating 404 as `None`
    pub async fn get_text_optional(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<String>, AdapterError> {
        let (status, body) = self.fetch(url, query).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AdapterError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if body.trim().is_empty() {
            return Err(AdapterError::EmptyBody(url.to_string()));
        }
        Ok(Some(body))
    }

    /// GET and parse a JSON body
    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, AdapterError> {
        let body = self.get_text(url, query).await?;
        parse_json(url, &body)
    }

    /// GET and parse a JSON body, treating 404 as `None`
    pub async fn get_json_optional(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<Value>, AdapterError> {
        match self.get_text_optional(url, query).await? {
            Some(body) => parse_json(url, &body).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_json(url: &str, body: &str) -> Result<Value, AdapterError> {
    serde_json::from_str(body)
        .map_err(|e| AdapterError::Malformed(format!("{} returned invalid JSON: {}", url, e)))
}

/// Join a base URL and a path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://rest.kegg.jp/", "/list/pathway/hsa"), "https://rest.kegg.jp/list/pathway/hsa");
        assert_eq!(join_url("http://x", "y"), "http://x/y");
    }

    #[tokio::test]
    async fn test_get_text_ok() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let body = fetcher().get_text(&join_url(&server.url(), "ok"), &[]).await.unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_empty_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/empty")
            .with_status(200)
            .with_body("\n")
            .create_async()
            .await;

        let err = fetcher()
            .get_text(&join_url(&server.url(), "empty"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::EmptyBody(_)));
    }

    #[tokio::test]
    async fn test_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let err = fetcher()
            .get_text(&join_url(&server.url(), "down"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_not_found_is_optional() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.json")
            .with_status(404)
            .create_async()
            .await;

        let url = join_url(&server.url(), "missing.json");
        assert!(fetcher().get_json_optional(&url, &[]).await.unwrap().is_none());
        assert!(fetcher().get_json(&url, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/bad.json")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = fetcher()
            .get_json(&join_url(&server.url(), "bad.json"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Malformed(_)));
    }
}
