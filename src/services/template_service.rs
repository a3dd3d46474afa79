use crate::error::{AppError, Result};
use crate::models::{Environment, Manifest, SolutionTemplate};
use crate::repository::TemplateRepository;
use crate::services::TemplateResolver;
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub url: String,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub images: Vec<String>,
}

/// Catalog administration and read-only introspection of template manifests.
#[derive(Clone)]
pub struct TemplateService {
    repo: TemplateRepository,
    resolver: TemplateResolver,
}

impl TemplateService {
    pub fn new(repo: TemplateRepository, resolver: TemplateResolver) -> Self {
        Self { repo, resolver }
    }

    pub async fn list_templates(&self, include_inactive: bool) -> Result<Vec<SolutionTemplate>> {
        self.repo.list(include_inactive).await
    }

    pub async fn create_template(&self, req: CreateTemplateRequest) -> Result<SolutionTemplate> {
        let mut details = Vec::new();
        if req.name.trim().is_empty() {
            details.push("field name should be provided".to_string());
        }
        if req.url.trim().is_empty() {
            details.push("field url should be provided".to_string());
        }
        if !details.is_empty() {
            return Err(AppError::Validation { details });
        }

        let now = Utc::now();
        let template = SolutionTemplate {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            url: req.url.trim().to_string(),
            cpu: req.cpu,
            ram: req.ram,
            images: serde_json::to_string(&req.images)?,
            active: true,
            created_at: now,
            updated_at: now,
        };
        if template.repo_path().is_none() {
            return Err(AppError::Validation {
                details: vec![format!("url {} has no repository path", template.url)],
            });
        }

        self.repo.create(&template).await?;
        tracing::info!("Template {} added from {}", template.name, template.url);
        Ok(template)
    }

    pub async fn activate_template(&self, name: &str) -> Result<()> {
        self.repo.update_active(name, true).await
    }

    pub async fn deactivate_template(&self, name: &str) -> Result<()> {
        self.repo.update_active(name, false).await
    }

    pub async fn delete_template(&self, name: &str) -> Result<()> {
        self.repo.delete(name).await?;
        tracing::info!("Template {} deleted", name);
        Ok(())
    }

    /// Default environment as declared, generator placeholders left unrendered.
    pub async fn template_env(&self, name: &str, branch: Option<&str>) -> Result<Environment> {
        Ok(self.raw_manifest(name, branch).await?.env)
    }

    /// Number of declared resources per type, unknown types included.
    pub async fn template_resources(
        &self,
        name: &str,
        branch: Option<&str>,
    ) -> Result<BTreeMap<String, usize>> {
        let manifest = self.raw_manifest(name, branch).await?;
        let mut counts = BTreeMap::new();
        for entry in manifest.run {
            *counts.entry(entry.entry_type.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn raw_manifest(&self, name: &str, branch: Option<&str>) -> Result<Manifest> {
        let resolved = self.resolver.resolve_manifest(name, branch).await?;
        serde_json::from_slice(&resolved.manifest)
            .map_err(|e| AppError::InvalidTemplate(format!("manifest: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::manifest::MANIFEST_FILE;
    use crate::testing::{self, FakeSource};
    use std::sync::Arc;

    async fn service() -> (TemplateService, Arc<FakeSource>) {
        let repo = TemplateRepository::new(testing::memory_pool().await);
        let source = Arc::new(FakeSource::default());
        let resolver = TemplateResolver::new(repo.clone(), source.clone(), "master".to_string());
        (TemplateService::new(repo, resolver), source)
    }

    fn create_request(name: &str) -> CreateTemplateRequest {
        CreateTemplateRequest {
            name: name.to_string(),
            url: "https://github.com/org/app".to_string(),
            images: vec!["nginx".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_requires_name_and_url() {
        let (service, _) = service().await;
        let err = service
            .create_template(CreateTemplateRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.details().len(), 2);

        let mut req = create_request("app");
        req.url = "https://github.com/".to_string();
        assert!(matches!(
            service.create_template(req).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn deactivated_templates_are_hidden_from_users() {
        let (service, _) = service().await;
        let created = service.create_template(create_request("app")).await.unwrap();
        assert_eq!(created.image_list(), vec!["nginx"]);

        service.deactivate_template("app").await.unwrap();
        assert!(service.list_templates(false).await.unwrap().is_empty());
        assert_eq!(service.list_templates(true).await.unwrap().len(), 1);

        service.activate_template("app").await.unwrap();
        assert_eq!(service.list_templates(false).await.unwrap().len(), 1);

        service.delete_template("app").await.unwrap();
        assert!(service.list_templates(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn introspection_reads_the_declared_manifest() {
        let (service, source) = service().await;
        service.create_template(create_request("app")).await.unwrap();
        source.put(
            "org/app",
            "dev",
            MANIFEST_FILE,
            r#"{"env": {"PASSWORD": "{{rand_string 8}}"},
                "run": [
                    {"config_file": "d.json", "type": "deployment"},
                    {"config_file": "w.json", "type": "deployment"},
                    {"config_file": "s.json", "type": "service"}
                ]}"#,
        );

        let env = service.template_env("app", Some("dev")).await.unwrap();
        assert_eq!(env["PASSWORD"], "{{rand_string 8}}");

        let counts = service.template_resources("app", Some("dev")).await.unwrap();
        assert_eq!(counts["deployment"], 2);
        assert_eq!(counts["service"], 1);
    }
}
