use crate::repository::DbPool;
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub async fn establish_connection(database_url: &str, max_connections: u32) -> Result<DbPool> {
    // Ensure the database URL has the correct format
    let db_url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{}", database_url)
    };

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    // Run migrations
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS templates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            url TEXT NOT NULL,
            cpu TEXT,
            ram TEXT,
            images TEXT NOT NULL DEFAULT '[]',
            active BOOLEAN NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS solutions (
            id TEXT PRIMARY KEY,
            template_id TEXT NOT NULL,
            name TEXT NOT NULL,
            namespace TEXT NOT NULL,
            user_id TEXT NOT NULL,
            deleted BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE TABLE IF NOT EXISTS parameters (
            solution_id TEXT PRIMARY KEY,
            branch TEXT NOT NULL,
            env TEXT NOT NULL,
            FOREIGN KEY (solution_id) REFERENCES solutions(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS deployments (
            solution_id TEXT NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY (solution_id, name),
            FOREIGN KEY (solution_id) REFERENCES solutions(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS services (
            solution_id TEXT NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY (solution_id, name),
            FOREIGN KEY (solution_id) REFERENCES solutions(id) ON DELETE CASCADE
        );

        -- one live solution per (namespace, name); soft-deleted rows do not count
        CREATE UNIQUE INDEX IF NOT EXISTS idx_solutions_live_name
            ON solutions(namespace, name) WHERE deleted = 0;
        CREATE INDEX IF NOT EXISTS idx_solutions_user_id ON solutions(user_id);
        CREATE INDEX IF NOT EXISTS idx_templates_active ON templates(active);
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn creates_ledger_schema() {
        let pool = establish_connection("sqlite::memory:", 1).await.unwrap();
        let tables: Vec<String> =
            sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap()
                .iter()
                .map(|row| row.get::<String, _>("name"))
                .collect();

        for table in ["deployments", "parameters", "services", "solutions", "templates"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
    }
}
