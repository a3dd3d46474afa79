use super::{ClientError, check_status, join_url};
use crate::models::ResourceKind;
use async_trait::async_trait;

/// Namespace-scoped create/delete of cluster objects.
///
/// Deleting an object the cluster does not know must yield
/// [`ClientError::NotFound`] so callers can treat it as already gone.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        document: &str,
    ) -> Result<(), ClientError>;

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError>;
}

#[derive(Clone)]
pub struct HttpClusterApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClusterApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn collection_url(&self, kind: ResourceKind, namespace: &str) -> String {
        join_url(
            &self.base_url,
            &format!("namespaces/{}/{}s", namespace, kind.as_str()),
        )
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        document: &str,
    ) -> Result<(), ClientError> {
        tracing::info!("Creating {} in {}", kind, namespace);
        let response = self
            .client
            .post(self.collection_url(kind, namespace))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(document.to_string())
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        tracing::info!("Deleting {} {} in {}", kind, name, namespace);
        let url = format!("{}/{}", self.collection_url(kind, namespace), name);
        let response = self.client.delete(url).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
