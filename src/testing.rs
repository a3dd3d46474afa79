//! In-process fakes and fixtures shared by unit tests.

use crate::clients::{ClientError, ClusterApi, FormatConverter, SourceRepository};
use crate::models::{ResourceKind, SolutionTemplate};
use crate::repository::{DbPool, establish_connection};
use crate::services::resource_name;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

pub async fn memory_pool() -> DbPool {
    establish_connection("sqlite::memory:", 1)
        .await
        .expect("in-memory database")
}

pub fn template(name: &str, url: &str) -> SolutionTemplate {
    let now = Utc::now();
    SolutionTemplate {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        url: url.to_string(),
        cpu: Some("500m".to_string()),
        ram: Some("256Mi".to_string()),
        images: r#"["nginx"]"#.to_string(),
        active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Files keyed by `repo/branch/file`.
#[derive(Default)]
pub struct FakeSource {
    files: Mutex<HashMap<String, Vec<u8>>>,
    stalled: Mutex<HashSet<String>>,
}

impl FakeSource {
    pub fn put(&self, repo_path: &str, branch: &str, file: &str, content: &str) {
        self.files.lock().insert(
            format!("{}/{}/{}", repo_path, branch, file),
            content.as_bytes().to_vec(),
        );
    }

    /// Fetches of this file never complete.
    pub fn stall(&self, repo_path: &str, branch: &str, file: &str) {
        self.stalled
            .lock()
            .insert(format!("{}/{}/{}", repo_path, branch, file));
    }
}

#[async_trait]
impl SourceRepository for FakeSource {
    async fn fetch_file(
        &self,
        repo_path: &str,
        branch: &str,
        file: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let key = format!("{}/{}/{}", repo_path, branch, file);
        let stalled = self.stalled.lock().contains(&key);
        if stalled {
            std::future::pending::<()>().await;
        }
        self.files
            .lock()
            .get(&key)
            .cloned()
            .ok_or(ClientError::NotFound(key))
    }
}

/// Cluster objects keyed by `(kind, namespace, name)`.
#[derive(Default)]
pub struct FakeCluster {
    objects: Mutex<HashSet<(ResourceKind, String, String)>>,
    submitted: Mutex<Vec<String>>,
    failing_creates: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl FakeCluster {
    pub fn fail_create(&self, name: &str) {
        self.failing_creates.lock().insert(name.to_string());
    }

    pub fn fail_delete(&self, name: &str) {
        self.failing_deletes.lock().insert(name.to_string());
    }

    pub fn heal_delete(&self, name: &str) {
        self.failing_deletes.lock().remove(name);
    }

    /// Drops an object behind the ledger's back.
    pub fn forget(&self, kind: ResourceKind, namespace: &str, name: &str) {
        self.objects
            .lock()
            .remove(&(kind, namespace.to_string(), name.to_string()));
    }

    pub fn contains(&self, kind: ResourceKind, namespace: &str, name: &str) -> bool {
        self.objects
            .lock()
            .contains(&(kind, namespace.to_string(), name.to_string()))
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().clone()
    }

    fn rejected(status: u16, name: &str) -> ClientError {
        ClientError::Status {
            url: format!("fake://{}", name),
            status,
            body: "rejected".to_string(),
        }
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        document: &str,
    ) -> Result<(), ClientError> {
        let parsed: serde_json::Value =
            serde_json::from_str(document).map_err(|_| Self::rejected(400, "document"))?;
        let name = resource_name(&parsed).ok_or_else(|| Self::rejected(400, "document"))?;
        if self.failing_creates.lock().contains(&name) {
            return Err(Self::rejected(422, &name));
        }

        self.submitted.lock().push(document.to_string());
        self.objects
            .lock()
            .insert((kind, namespace.to_string(), name));
        Ok(())
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        if self.failing_deletes.lock().contains(name) {
            return Err(Self::rejected(500, name));
        }
        let removed = self
            .objects
            .lock()
            .remove(&(kind, namespace.to_string(), name.to_string()));
        if removed {
            Ok(())
        } else {
            Err(ClientError::NotFound(format!("{}/{}", namespace, name)))
        }
    }
}

/// Tags documents with the kind they were converted for.
#[derive(Default)]
pub struct FakeConverter {
    fail: bool,
}

impl FakeConverter {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl FormatConverter for FakeConverter {
    async fn convert(&self, kind: ResourceKind, document: &str) -> Result<String, ClientError> {
        if self.fail {
            return Err(ClientError::Status {
                url: "fake://convert".to_string(),
                status: 400,
                body: "cannot convert".to_string(),
            });
        }
        let mut parsed: serde_json::Value = serde_json::from_str(document).map_err(|_| {
            ClientError::Status {
                url: "fake://convert".to_string(),
                status: 400,
                body: "not json".to_string(),
            }
        })?;
        if let Some(object) = parsed.as_object_mut() {
            object.insert("converted".to_string(), kind.as_str().into());
        }
        Ok(parsed.to_string())
    }
}
