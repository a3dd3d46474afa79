use crate::error::AppError;
use crate::models::{Environment, SolutionInstance};
use crate::services::RunSolutionRequest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RunSolutionBody {
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub name: String,
    pub branch: Option<String>,
    #[serde(default)]
    pub env: Environment,
}

impl RunSolutionBody {
    pub fn into_request(self, namespace: String) -> RunSolutionRequest {
        RunSolutionRequest {
            template: self.template,
            name: self.name,
            namespace,
            branch: self.branch,
            env: self.env,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SolutionResponse {
    pub id: String,
    pub template: String,
    pub name: String,
    pub namespace: String,
    pub user_id: String,
    pub branch: String,
    pub env: Environment,
    pub created_at: String,
}

impl TryFrom<SolutionInstance> for SolutionResponse {
    type Error = AppError;

    fn try_from(instance: SolutionInstance) -> Result<Self, Self::Error> {
        let env = instance.environment()?;
        Ok(Self {
            id: instance.id,
            template: instance.template_name,
            name: instance.name,
            namespace: instance.namespace,
            user_id: instance.user_id,
            branch: instance.branch,
            env,
            created_at: instance.created_at.to_rfc3339(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SolutionsListResponse {
    pub solutions: Vec<SolutionResponse>,
}

#[derive(Debug, Serialize)]
pub struct NamespaceCleanupResponse {
    pub removed: u64,
}
