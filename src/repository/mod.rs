pub mod connection;
pub mod solution_repository;
pub mod template_repository;

pub use connection::establish_connection;
pub use solution_repository::SolutionRepository;
pub use template_repository::TemplateRepository;

use crate::error::AppError;

pub type DbPool = sqlx::SqlitePool;

/// Unique-constraint violations surface as `ResourceAlreadyExists`.
pub(crate) fn map_insert_error(err: sqlx::Error, what: impl Into<String>) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::ResourceAlreadyExists(what.into())
        }
        _ => AppError::Database(err),
    }
}
