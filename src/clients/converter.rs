use super::{ClientError, check_status, join_url};
use crate::models::ResourceKind;
use async_trait::async_trait;

/// Turns a rendered document into the shape the cluster API accepts.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    async fn convert(&self, kind: ResourceKind, document: &str) -> Result<String, ClientError>;
}

#[derive(Clone)]
pub struct HttpFormatConverter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFormatConverter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FormatConverter for HttpFormatConverter {
    async fn convert(&self, kind: ResourceKind, document: &str) -> Result<String, ClientError> {
        tracing::debug!("Converting {}", kind);
        let url = join_url(&self.base_url, &format!("convert/fromkube/{}", kind.as_str()));
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(document.to_string())
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }
}
