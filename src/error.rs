use crate::models::ResourceKind;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template fetch failed: {0}")]
    TemplateFetchFailed(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Resource with this name already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Ledger transaction failed: {0}")]
    LedgerTransaction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unable to create solution")]
    UnableToCreateSolution { details: Vec<String> },

    #[error("Unable to delete solution")]
    UnableToDeleteSolution { details: Vec<String> },

    #[error("Solution not found: {0}")]
    SolutionNotFound(String),

    #[error("Request validation failed")]
    Validation { details: Vec<String> },

    #[error("Admin access required")]
    AdminRequired,
}

impl AppError {
    pub fn details(&self) -> &[String] {
        match self {
            Self::UnableToCreateSolution { details }
            | Self::UnableToDeleteSolution { details }
            | Self::Validation { details } => details,
            _ => &[],
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::LedgerTransaction(e) => {
                tracing::error!("Ledger transaction error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::TemplateNotFound(_) | AppError::SolutionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::TemplateFetchFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidTemplate(_) | AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::ResourceAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::UnableToCreateSolution { .. } | AppError::UnableToDeleteSolution { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::AdminRequired => StatusCode::FORBIDDEN,
        };

        let body = json!({
            "error": self.to_string(),
            "details": self.details(),
        });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of a single manifest entry. Never aborts the pipeline loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("unable to create {kind} {name}: {cause}")]
    RenderFailed {
        kind: ResourceKind,
        name: String,
        cause: String,
    },

    #[error("unable to create {kind} {name}: {cause}")]
    MaterializeFailed {
        kind: ResourceKind,
        name: String,
        cause: String,
    },

    #[error("unable to create {kind} {name}: resource with this name already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    #[error("unknown resource type {kind} for {name}, skipping")]
    UnknownKind { kind: String, name: String },
}

/// Materialization failure: either one entry failed, or the ledger itself broke.
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Ledger(AppError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_errors_follow_unable_to_create_format() {
        let err = ResourceError::RenderFailed {
            kind: ResourceKind::Service,
            name: "s.json".into(),
            cause: "bad template".into(),
        };
        assert_eq!(err.to_string(), "unable to create service s.json: bad template");

        let err = ResourceError::AlreadyExists {
            kind: ResourceKind::Deployment,
            name: "d.json".into(),
        };
        assert!(err.to_string().starts_with("unable to create deployment d.json: "));
    }

    #[test]
    fn aggregate_errors_expose_details() {
        let err = AppError::UnableToCreateSolution {
            details: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.details(), ["a".to_string(), "b".to_string()]);
        assert!(AppError::SolutionNotFound("x".into()).details().is_empty());
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::TemplateNotFound("t".into()), StatusCode::NOT_FOUND),
            (AppError::ResourceAlreadyExists("x".into()), StatusCode::CONFLICT),
            (AppError::Validation { details: vec![] }, StatusCode::BAD_REQUEST),
            (
                AppError::TemplateFetchFailed("down".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::AdminRequired, StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
