use super::Environment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SolutionInstance {
    pub id: String,
    pub template_id: String,
    pub template_name: String,
    pub name: String,
    pub namespace: String,
    pub user_id: String,
    pub branch: String,
    /// Composed environment, serialized as a JSON object.
    pub env: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SolutionInstance {
    pub fn environment(&self) -> serde_json::Result<Environment> {
        serde_json::from_str(&self.env)
    }
}

/// Ledger input for a new instance row plus its parameters row.
#[derive(Debug, Clone)]
pub struct NewSolution {
    pub template_id: String,
    pub name: String,
    pub namespace: String,
    pub user_id: String,
    pub branch: String,
    pub env: String,
}

/// Names of one kind of object owned by an instance, with the namespace they live in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OwnedResources {
    pub namespace: Option<String>,
    pub names: Vec<String>,
}
