use crate::error::{AppError, Result};
use crate::models::SolutionTemplate;
use crate::repository::{DbPool, map_insert_error};
use chrono::Utc;

const TEMPLATE_COLUMNS: &str = "id, name, url, cpu, ram, images, active, created_at, updated_at";

#[derive(Clone)]
pub struct TemplateRepository {
    pool: DbPool,
}

impl TemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<SolutionTemplate>> {
        let filter = if include_inactive {
            ""
        } else {
            "WHERE active = 1"
        };
        let templates = sqlx::query_as::<_, SolutionTemplate>(&format!(
            "SELECT {} FROM templates {} ORDER BY name",
            TEMPLATE_COLUMNS, filter
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    /// Looks up a template the pipeline may instantiate. Inactive templates are hidden.
    pub async fn get_active(&self, name: &str) -> Result<SolutionTemplate> {
        let template = sqlx::query_as::<_, SolutionTemplate>(&format!(
            "SELECT {} FROM templates WHERE name = ? AND active = 1",
            TEMPLATE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::TemplateNotFound(name.to_string()))?;

        Ok(template)
    }

    pub async fn create(&self, template: &SolutionTemplate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, name, url, cpu, ram, images, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&template.url)
        .bind(&template.cpu)
        .bind(&template.ram)
        .bind(&template.images)
        .bind(template.active)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, format!("template {}", template.name)))?;

        Ok(())
    }

    pub async fn update_active(&self, name: &str, active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE templates SET active = ?, updated_at = ? WHERE name = ?")
            .bind(active)
            .bind(Utc::now())
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::TemplateNotFound(name.to_string()));
        }

        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM templates WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::TemplateNotFound(name.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn inactive_templates_are_not_resolvable() {
        let pool = testing::memory_pool().await;
        let repo = TemplateRepository::new(pool);
        repo.create(&testing::template("app", "https://github.com/org/app"))
            .await
            .unwrap();

        assert_eq!(repo.get_active("app").await.unwrap().name, "app");

        repo.update_active("app", false).await.unwrap();
        assert!(matches!(
            repo.get_active("app").await,
            Err(AppError::TemplateNotFound(_))
        ));
        assert!(repo.list(false).await.unwrap().is_empty());
        assert_eq!(repo.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let repo = TemplateRepository::new(testing::memory_pool().await);
        repo.create(&testing::template("app", "https://github.com/org/app"))
            .await
            .unwrap();

        let err = repo
            .create(&testing::template("app", "https://github.com/org/other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceAlreadyExists(_)));
    }

    #[tokio::test]
    async fn unknown_template_updates_report_not_found() {
        let repo = TemplateRepository::new(testing::memory_pool().await);
        assert!(matches!(
            repo.update_active("ghost", true).await,
            Err(AppError::TemplateNotFound(_))
        ));
        assert!(matches!(
            repo.delete("ghost").await,
            Err(AppError::TemplateNotFound(_))
        ));
    }
}
