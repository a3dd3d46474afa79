use crate::models::{Environment, SolutionTemplate};
use crate::services::CreateTemplateRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct CreateTemplateBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl From<CreateTemplateBody> for CreateTemplateRequest {
    fn from(body: CreateTemplateBody) -> Self {
        Self {
            name: body.name,
            url: body.url,
            cpu: body.cpu,
            ram: body.ram,
            images: body.images,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BranchQuery {
    pub branch: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub id: String,
    pub name: String,
    pub url: String,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub images: Vec<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SolutionTemplate> for TemplateResponse {
    fn from(template: SolutionTemplate) -> Self {
        Self {
            images: template.image_list(),
            id: template.id,
            name: template.name,
            url: template.url,
            cpu: template.cpu,
            ram: template.ram,
            active: template.active,
            created_at: template.created_at.to_rfc3339(),
            updated_at: template.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemplatesListResponse {
    pub data: Vec<TemplateResponse>,
}

#[derive(Debug, Serialize)]
pub struct TemplateEnvResponse {
    pub env: Environment,
}

#[derive(Debug, Serialize)]
pub struct TemplateResourcesResponse {
    pub resources: BTreeMap<String, usize>,
}
