use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Why a document could not be obtained. Either way the unit of work it
/// belonged to ends; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { .. } => None,
        }
    }
}

/// Source of HTML documents, modelled on an HTTP GET: a body on success,
/// a [`FetchError`] for any non-200 status or transport failure.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Pairing page of one round: `<base>/tournament/<id>/pairings?round=<n>`.
pub fn pairings_url(base_url: &str, tournament_id: &str, round: i64) -> String {
    format!(
        "{}/tournament/{}/pairings?round={}",
        base_url.trim_end_matches('/'),
        tournament_id,
        round
    )
}

/// reqwest-backed provider with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpDocumentProvider {
    http: Client,
}

impl HttpDocumentProvider {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl DocumentProvider for HttpDocumentProvider {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self.http.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await.map_err(transport)?;
        debug!(url, bytes = body.len(), "document fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairings_url_shape() {
        assert_eq!(
            pairings_url("https://play.limitlesstcg.com/", "abc123", 4),
            "https://play.limitlesstcg.com/tournament/abc123/pairings?round=4"
        );
    }

    #[tokio::test]
    async fn http_provider_maps_status_codes() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("<p>hi</p>")
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let provider = HttpDocumentProvider::new("pocket-meta-test", 5).unwrap();
        let body = provider.fetch(&format!("{}/ok", server.url())).await.unwrap();
        assert_eq!(body, "<p>hi</p>");

        let err = provider
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));

        ok.assert_async().await;
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let provider = HttpDocumentProvider::new("pocket-meta-test", 2).unwrap();
        let err = provider.fetch("http://127.0.0.1:1/nothing").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(err.status(), None);
    }
}
