use crate::error::{AppError, Result};
use crate::models::{NewSolution, OwnedResources, ResourceKind, SolutionInstance};
use crate::repository::{DbPool, map_insert_error};
use chrono::Utc;
use sqlx::SqliteConnection;
use std::future::Future;
use std::pin::Pin;

/// Future returned by a unit of work run inside [`SolutionRepository::transactional`].
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>>;

const INSTANCE_SELECT: &str = r#"
    SELECT s.id, s.template_id, COALESCE(t.name, '') AS template_name, s.name, s.namespace,
           s.user_id, p.branch, p.env, s.deleted, s.created_at, s.deleted_at
    FROM solutions s
    JOIN parameters p ON p.solution_id = s.id
    LEFT JOIN templates t ON t.id = s.template_id
"#;

/// Ledger of solution instances and the cluster objects each one owns.
#[derive(Clone)]
pub struct SolutionRepository {
    pool: DbPool,
}

impl SolutionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs `unit` in its own transaction: commit on `Ok`, rollback on `Err`.
    ///
    /// The unit executes on a spawned task, so once begun it finishes even if
    /// the caller is dropped. Begin/commit/rollback failures and an aborted
    /// task surface as [`AppError::LedgerTransaction`].
    pub async fn transactional<T, F>(&self, unit: F) -> Result<T>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> TxFuture<'c, T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let handle = tokio::spawn(async move {
            let mut tx = pool
                .begin()
                .await
                .map_err(|e| AppError::LedgerTransaction(format!("begin: {}", e)))?;

            match unit(&mut *tx).await {
                Ok(value) => {
                    tx.commit()
                        .await
                        .map_err(|e| AppError::LedgerTransaction(format!("commit: {}", e)))?;
                    Ok(value)
                }
                Err(err) => {
                    tx.rollback()
                        .await
                        .map_err(|e| AppError::LedgerTransaction(format!("rollback: {}", e)))?;
                    Err(err)
                }
            }
        });

        handle
            .await
            .map_err(|e| AppError::LedgerTransaction(format!("unit of work aborted: {}", e)))?
    }

    /// Inserts the instance row and its parameters row; returns the new instance ID.
    pub async fn create_instance(&self, solution: NewSolution) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.transactional(move |conn| Box::pin(insert_instance(conn, id, solution)))
            .await
    }

    pub async fn record_owned_resource(
        &self,
        instance_id: &str,
        kind: ResourceKind,
        name: &str,
    ) -> Result<()> {
        let instance_id = instance_id.to_string();
        let name = name.to_string();
        self.transactional(move |conn| Box::pin(insert_owned(conn, instance_id, kind, name)))
            .await
    }

    /// Names of `kind` objects owned by the live instance `(namespace, name)`.
    /// An unknown instance owns nothing.
    pub async fn list_owned_resources(
        &self,
        namespace: &str,
        name: &str,
        kind: ResourceKind,
    ) -> Result<OwnedResources> {
        let namespace = namespace.to_string();
        let name = name.to_string();
        self.transactional(move |conn| Box::pin(select_owned(conn, namespace, name, kind)))
            .await
    }

    pub async fn find_live(&self, namespace: &str, name: &str) -> Result<SolutionInstance> {
        let instance = sqlx::query_as::<_, SolutionInstance>(&format!(
            "{} WHERE s.namespace = ? AND s.name = ? AND s.deleted = 0",
            INSTANCE_SELECT
        ))
        .bind(namespace)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::SolutionNotFound(format!("{}/{}", namespace, name)))?;

        Ok(instance)
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<SolutionInstance>> {
        let instances = sqlx::query_as::<_, SolutionInstance>(&format!(
            "{} WHERE s.user_id = ? AND s.deleted = 0 ORDER BY s.created_at DESC",
            INSTANCE_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    pub async fn list_by_namespace(&self, namespace: &str) -> Result<Vec<SolutionInstance>> {
        let instances = sqlx::query_as::<_, SolutionInstance>(&format!(
            "{} WHERE s.namespace = ? AND s.deleted = 0 ORDER BY s.created_at DESC",
            INSTANCE_SELECT
        ))
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    /// Marks the instance deleted; its rows stay for history.
    pub async fn soft_delete(&self, instance_id: &str) -> Result<()> {
        let instance_id = instance_id.to_string();
        self.transactional(move |conn| Box::pin(mark_deleted(conn, instance_id)))
            .await
    }

    /// Removes the instance together with its parameters and owned-resource rows.
    pub async fn hard_delete(&self, instance_id: &str) -> Result<()> {
        let instance_id = instance_id.to_string();
        self.transactional(move |conn| Box::pin(remove_instance(conn, instance_id)))
            .await
    }

    /// Removes every ledger entry of a namespace, live or soft-deleted.
    pub async fn hard_delete_namespace(&self, namespace: &str) -> Result<u64> {
        let namespace = namespace.to_string();
        self.transactional(move |conn| Box::pin(remove_namespace(conn, namespace)))
            .await
    }
}

fn owned_table(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Deployment => "deployments",
        ResourceKind::Service => "services",
    }
}

async fn insert_instance(
    conn: &mut SqliteConnection,
    id: String,
    solution: NewSolution,
) -> Result<String> {
    sqlx::query(
        r#"
        INSERT INTO solutions (id, template_id, name, namespace, user_id, deleted, created_at, deleted_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, NULL)
        "#,
    )
    .bind(&id)
    .bind(&solution.template_id)
    .bind(&solution.name)
    .bind(&solution.namespace)
    .bind(&solution.user_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| map_insert_error(e, format!("solution {}/{}", solution.namespace, solution.name)))?;

    sqlx::query("INSERT INTO parameters (solution_id, branch, env) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&solution.branch)
        .bind(&solution.env)
        .execute(&mut *conn)
        .await?;

    Ok(id)
}

async fn insert_owned(
    conn: &mut SqliteConnection,
    instance_id: String,
    kind: ResourceKind,
    name: String,
) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (solution_id, name) VALUES (?, ?)",
        owned_table(kind)
    ))
    .bind(&instance_id)
    .bind(&name)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_insert_error(e, format!("{} {}", kind, name)))?;

    Ok(())
}

async fn select_owned(
    conn: &mut SqliteConnection,
    namespace: String,
    name: String,
    kind: ResourceKind,
) -> Result<OwnedResources> {
    let rows: Vec<(String, String)> = sqlx::query_as(&format!(
        r#"
        SELECT s.namespace, r.name
        FROM solutions s
        JOIN {} r ON r.solution_id = s.id
        WHERE s.namespace = ? AND s.name = ? AND s.deleted = 0
        ORDER BY r.rowid
        "#,
        owned_table(kind)
    ))
    .bind(&namespace)
    .bind(&name)
    .fetch_all(&mut *conn)
    .await?;

    let mut owned = OwnedResources::default();
    for (ns, resource) in rows {
        owned.namespace.get_or_insert(ns);
        owned.names.push(resource);
    }
    Ok(owned)
}

async fn mark_deleted(conn: &mut SqliteConnection, instance_id: String) -> Result<()> {
    let result = sqlx::query(
        "UPDATE solutions SET deleted = 1, deleted_at = ? WHERE id = ? AND deleted = 0",
    )
    .bind(Utc::now())
    .bind(&instance_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::SolutionNotFound(instance_id));
    }
    Ok(())
}

async fn remove_instance(conn: &mut SqliteConnection, instance_id: String) -> Result<()> {
    let result = sqlx::query("DELETE FROM solutions WHERE id = ?")
        .bind(&instance_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::SolutionNotFound(instance_id));
    }
    Ok(())
}

async fn remove_namespace(conn: &mut SqliteConnection, namespace: String) -> Result<u64> {
    let result = sqlx::query("DELETE FROM solutions WHERE namespace = ?")
        .bind(&namespace)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
