use super::{ClientError, check_status, join_url};
use async_trait::async_trait;

/// Raw file access to template repositories.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn fetch_file(
        &self,
        repo_path: &str,
        branch: &str,
        file: &str,
    ) -> Result<Vec<u8>, ClientError>;
}

#[derive(Clone)]
pub struct HttpSourceRepository {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSourceRepository {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn file_url(&self, repo_path: &str, branch: &str, file: &str) -> String {
        join_url(
            &self.base_url,
            &format!(
                "{}/{}/{}",
                repo_path.trim_matches('/'),
                branch.trim(),
                file.trim_start_matches('/')
            ),
        )
    }
}

#[async_trait]
impl SourceRepository for HttpSourceRepository {
    async fn fetch_file(
        &self,
        repo_path: &str,
        branch: &str,
        file: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let url = self.file_url(repo_path, branch, file);
        tracing::debug!("Downloading {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_raw_file_url() {
        let source = HttpSourceRepository::new(
            reqwest::Client::new(),
            "https://raw.githubusercontent.com/",
        );
        assert_eq!(
            source.file_url("/org/app/", "master", ".containerum.json"),
            "https://raw.githubusercontent.com/org/app/master/.containerum.json"
        );
        assert_eq!(
            source.file_url("org/app", " dev ", "/k8s/d.json"),
            "https://raw.githubusercontent.com/org/app/dev/k8s/d.json"
        );
    }
}
