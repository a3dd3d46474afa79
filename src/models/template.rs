use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SolutionTemplate {
    pub id: String,
    pub name: String,
    pub url: String,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    /// JSON array of image references the template may run.
    pub images: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SolutionTemplate {
    /// Repository path (`org/app`) of the template's source URL.
    pub fn repo_path(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.url).ok()?;
        let path = url.path().trim_matches('/').trim();
        if path.is_empty() {
            return None;
        }
        Some(path.to_string())
    }

    pub fn image_list(&self) -> Vec<String> {
        serde_json::from_str(&self.images).unwrap_or_default()
    }
}
