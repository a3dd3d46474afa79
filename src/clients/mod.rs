pub mod cluster;
pub mod converter;
pub mod source;

pub use cluster::{ClusterApi, HttpClusterApi};
pub use converter::{FormatConverter, HttpFormatConverter};
pub use source::{HttpSourceRepository, SourceRepository};

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Maps 404 to `NotFound` and any other non-2xx status to `Status`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(url));
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        url,
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://a/", "/b/c"), "http://a/b/c");
        assert_eq!(join_url("http://a", "b"), "http://a/b");
    }

    #[test]
    fn not_found_is_distinguishable() {
        assert!(ClientError::NotFound("x".into()).is_not_found());
        let other = ClientError::Status {
            url: "x".into(),
            status: 500,
            body: String::new(),
        };
        assert!(!other.is_not_found());
    }
}
