//! Text fetch helper
//!
//! Failures never reach the caller as errors: they are logged and turned into
//! `None` at this boundary.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// A client with the fetch timeout applied
pub fn client() -> Result<Client, FetchError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?)
}

/// GET `url` as text, failing on transport errors and non-success statuses.
pub async fn try_fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(response.text().await?)
}

/// GET `url` as text, or `None` (logged) on any failure.
pub async fn fetch_text(client: &Client, url: &str) -> Option<String> {
    match try_fetch_text(client, url).await {
        Ok(text) => Some(text),
        Err(e) => {
            log::error!("Failed to fetch {}: {}", url, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/data.json", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let url = serve_once("200 OK", r#"{"imports":{}}"#).await;
        let text = fetch_text(&client().unwrap(), &url).await;
        assert_eq!(text.as_deref(), Some(r#"{"imports":{}}"#));
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_none() {
        let url = serve_once("404 Not Found", "missing").await;
        assert!(fetch_text(&client().unwrap(), &url).await.is_none());

        let url = serve_once("404 Not Found", "missing").await;
        let err = try_fetch_text(&client().unwrap(), &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/", addr);
        assert!(fetch_text(&client().unwrap(), &url).await.is_none());
    }
}
