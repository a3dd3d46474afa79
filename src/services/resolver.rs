use crate::clients::SourceRepository;
use crate::error::{AppError, Result};
use crate::models::{SolutionTemplate, manifest::MANIFEST_FILE};
use crate::repository::TemplateRepository;
use std::sync::Arc;

/// A template located in its source repository, with the raw manifest fetched.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub template: SolutionTemplate,
    pub repo_path: String,
    pub branch: String,
    pub manifest: Vec<u8>,
}

#[derive(Clone)]
pub struct TemplateResolver {
    templates: TemplateRepository,
    source: Arc<dyn SourceRepository>,
    default_branch: String,
}

impl TemplateResolver {
    pub fn new(
        templates: TemplateRepository,
        source: Arc<dyn SourceRepository>,
        default_branch: String,
    ) -> Self {
        Self {
            templates,
            source,
            default_branch,
        }
    }

    /// Blank or missing branches resolve to the configured default.
    pub fn branch_or_default(&self, branch: Option<&str>) -> String {
        match branch.map(str::trim) {
            Some(branch) if !branch.is_empty() => branch.to_string(),
            _ => self.default_branch.clone(),
        }
    }

    pub async fn resolve_manifest(
        &self,
        template_name: &str,
        branch: Option<&str>,
    ) -> Result<ResolvedTemplate> {
        let template = self.templates.get_active(template_name).await?;
        let repo_path = template.repo_path().ok_or_else(|| {
            AppError::InvalidTemplate(format!(
                "template {} has no repository path in {}",
                template.name, template.url
            ))
        })?;
        let branch = self.branch_or_default(branch);

        tracing::debug!("Fetching manifest of {} from {}@{}", template.name, repo_path, branch);
        let manifest = self
            .source
            .fetch_file(&repo_path, &branch, MANIFEST_FILE)
            .await
            .map_err(|e| {
                AppError::TemplateFetchFailed(format!(
                    "{}@{}/{}: {}",
                    repo_path, branch, MANIFEST_FILE, e
                ))
            })?;

        Ok(ResolvedTemplate {
            template,
            repo_path,
            branch,
            manifest,
        })
    }

    pub async fn fetch_resource_file(
        &self,
        repo_path: &str,
        branch: &str,
        resource: &str,
    ) -> std::result::Result<Vec<u8>, crate::clients::ClientError> {
        self.source.fetch_file(repo_path, branch, resource).await
    }
}
