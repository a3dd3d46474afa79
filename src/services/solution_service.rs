use crate::clients::ClusterApi;
use crate::error::{AppError, MaterializeError, ResourceError, Result};
use crate::models::{
    EntryType, Environment, ManifestEntry, NewSolution, OwnedResources, ResourceKind,
    SolutionInstance,
};
use crate::repository::SolutionRepository;
use crate::services::{EnvironmentCompositor, Materializer, ResourceRenderer, TemplateResolver};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RunSolutionRequest {
    pub template: String,
    pub name: String,
    pub namespace: String,
    pub branch: Option<String>,
    pub env: Environment,
}

impl RunSolutionRequest {
    fn validate(&self, owner: &str) -> Result<()> {
        let details: Vec<String> = [
            ("template", &self.template),
            ("name", &self.name),
            ("namespace", &self.namespace),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| format!("field {} should be provided", field))
        .chain(
            owner
                .trim()
                .is_empty()
                .then(|| "owner should be provided".to_string()),
        )
        .collect();

        if details.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation { details })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSolutionResult {
    pub created: usize,
    #[serde(rename = "notCreated")]
    pub not_created: usize,
    pub errors: Vec<String>,
}

enum AttemptOutcome {
    CreatedSome(RunSolutionResult),
    CreatedNone(Vec<String>),
}

/// Tally of one instantiation; pending until [`InstantiationAttempt::finish`].
struct InstantiationAttempt {
    declared: usize,
    created: usize,
    errors: Vec<String>,
}

impl InstantiationAttempt {
    fn new(declared: usize) -> Self {
        Self {
            declared,
            created: 0,
            errors: Vec::new(),
        }
    }

    fn record_created(&mut self) {
        self.created += 1;
    }

    fn record_failure(&mut self, err: ResourceError) {
        tracing::warn!("{}", err);
        self.errors.push(err.to_string());
    }

    fn finish(self) -> AttemptOutcome {
        if self.created == 0 {
            return AttemptOutcome::CreatedNone(self.errors);
        }
        AttemptOutcome::CreatedSome(RunSolutionResult {
            created: self.created,
            not_created: self.declared - self.created,
            errors: self.errors,
        })
    }
}

/// Removes an instance that owns nothing yet if the attempt is abandoned.
///
/// Dropping the guard while armed (the request future was cancelled) hands
/// the hard delete to a spawned task, the same way ledger units of work are
/// detached from their caller.
struct RollbackGuard {
    ledger: SolutionRepository,
    instance_id: Option<String>,
}

impl RollbackGuard {
    fn arm(ledger: SolutionRepository, instance_id: String) -> Self {
        Self {
            ledger,
            instance_id: Some(instance_id),
        }
    }

    /// The instance owns at least one object and stands on its own.
    fn disarm(&mut self) {
        self.instance_id = None;
    }

    async fn roll_back(mut self) {
        if let Some(instance_id) = self.instance_id.take() {
            roll_back_instance(&self.ledger, &instance_id).await;
        }
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        let Some(instance_id) = self.instance_id.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("Instantiation of {} abandoned, rolling back", instance_id);
                let ledger = self.ledger.clone();
                handle.spawn(async move { roll_back_instance(&ledger, &instance_id).await });
            }
            Err(_) => tracing::error!("No runtime to roll back instance {}", instance_id),
        }
    }
}

/// Best effort: the caller still sees the creation error if this fails.
async fn roll_back_instance(ledger: &SolutionRepository, instance_id: &str) {
    match ledger.hard_delete(instance_id).await {
        Ok(()) => tracing::info!("Rolled back solution instance {}", instance_id),
        Err(err) => tracing::error!("Failed to roll back instance {}: {}", instance_id, err),
    }
}

/// Instantiation and teardown of solutions.
#[derive(Clone)]
pub struct SolutionService {
    resolver: TemplateResolver,
    compositor: EnvironmentCompositor,
    renderer: ResourceRenderer,
    materializer: Materializer,
    cluster: Arc<dyn ClusterApi>,
    ledger: SolutionRepository,
}

impl SolutionService {
    pub fn new(
        resolver: TemplateResolver,
        compositor: EnvironmentCompositor,
        materializer: Materializer,
        cluster: Arc<dyn ClusterApi>,
        ledger: SolutionRepository,
    ) -> Self {
        Self {
            renderer: ResourceRenderer::new(resolver.clone()),
            resolver,
            compositor,
            materializer,
            cluster,
            ledger,
        }
    }

    /// Creates the instance, then renders and materializes each manifest
    /// entry in order. Fails with `UnableToCreateSolution` when nothing was created.
    pub async fn run_solution(
        &self,
        owner: &str,
        request: RunSolutionRequest,
    ) -> Result<RunSolutionResult> {
        request.validate(owner)?;

        let resolved = self
            .resolver
            .resolve_manifest(&request.template, request.branch.as_deref())
            .await?;
        let manifest = self.compositor.render_manifest(&resolved.manifest)?;
        let env = self
            .compositor
            .compose(manifest.env, &request.env, &request.namespace, owner);

        let instance_id = self
            .ledger
            .create_instance(NewSolution {
                template_id: resolved.template.id.clone(),
                name: request.name.clone(),
                namespace: request.namespace.clone(),
                user_id: owner.to_string(),
                branch: resolved.branch.clone(),
                env: serde_json::to_string(&env)?,
            })
            .await?;
        tracing::info!(
            "Instantiating {} as {}/{} ({} resources)",
            resolved.template.name,
            request.namespace,
            request.name,
            manifest.run.len()
        );

        let mut guard = RollbackGuard::arm(self.ledger.clone(), instance_id.clone());
        let mut attempt = InstantiationAttempt::new(manifest.run.len());
        for entry in &manifest.run {
            let outcome = self
                .instantiate_entry(
                    &instance_id,
                    &request.namespace,
                    entry,
                    &resolved.repo_path,
                    &resolved.branch,
                    &env,
                )
                .await;

            match outcome {
                Ok(()) => {
                    attempt.record_created();
                    guard.disarm();
                }
                Err(MaterializeError::Resource(err)) => attempt.record_failure(err),
                Err(MaterializeError::Ledger(err)) => {
                    guard.roll_back().await;
                    return Err(err);
                }
            }
        }

        match attempt.finish() {
            AttemptOutcome::CreatedSome(result) => {
                tracing::info!(
                    "Solution {}/{} created: {} created, {} not created",
                    request.namespace,
                    request.name,
                    result.created,
                    result.not_created
                );
                Ok(result)
            }
            AttemptOutcome::CreatedNone(details) => {
                guard.roll_back().await;
                Err(AppError::UnableToCreateSolution { details })
            }
        }
    }

    async fn instantiate_entry(
        &self,
        instance_id: &str,
        namespace: &str,
        entry: &ManifestEntry,
        repo_path: &str,
        branch: &str,
        env: &Environment,
    ) -> std::result::Result<(), MaterializeError> {
        let kind = match &entry.entry_type {
            EntryType::Resource(kind) => *kind,
            EntryType::Unknown(raw) => {
                return Err(ResourceError::UnknownKind {
                    kind: raw.clone(),
                    name: entry.name.clone(),
                }
                .into());
            }
        };

        let rendered = self
            .renderer
            .render(kind, &entry.name, repo_path, branch, env)
            .await?;
        self.materializer
            .materialize(instance_id, namespace, kind, &entry.name, &rendered)
            .await
    }

    /// Deletes every owned object, then the ledger entry. Objects already gone
    /// count as deleted; any other failure keeps the entry so the call can be retried.
    pub async fn delete_solution(&self, namespace: &str, name: &str) -> Result<()> {
        let instance = self.ledger.find_live(namespace, name).await?;

        let mut errors = Vec::new();
        for kind in [ResourceKind::Deployment, ResourceKind::Service] {
            let owned = self.ledger.list_owned_resources(namespace, name, kind).await?;
            let target_namespace = owned.namespace.as_deref().unwrap_or(namespace);

            for resource in &owned.names {
                match self.cluster.delete(kind, target_namespace, resource).await {
                    Ok(()) => {}
                    Err(err) if err.is_not_found() => {
                        tracing::debug!("{} {} already absent", kind, resource);
                    }
                    Err(err) => {
                        tracing::warn!("Failed to delete {} {}: {}", kind, resource, err);
                        errors.push(format!("unable to delete {} {}: {}", kind, resource, err));
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(AppError::UnableToDeleteSolution { details: errors });
        }

        self.ledger.soft_delete(&instance.id).await?;
        tracing::info!("Solution {}/{} deleted", namespace, name);
        Ok(())
    }

    pub async fn list_owned(
        &self,
        namespace: &str,
        name: &str,
        kind: ResourceKind,
    ) -> Result<OwnedResources> {
        self.ledger.list_owned_resources(namespace, name, kind).await
    }

    pub async fn get_solution(&self, namespace: &str, name: &str) -> Result<SolutionInstance> {
        self.ledger.find_live(namespace, name).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<SolutionInstance>> {
        self.ledger.list_by_user(user_id).await
    }

    pub async fn list_for_namespace(&self, namespace: &str) -> Result<Vec<SolutionInstance>> {
        self.ledger.list_by_namespace(namespace).await
    }

    /// Forgets every solution of a namespace without touching the cluster.
    pub async fn delete_namespace_solutions(&self, namespace: &str) -> Result<u64> {
        let removed = self.ledger.hard_delete_namespace(namespace).await?;
        tracing::info!("Removed {} solution entries of namespace {}", removed, namespace);
        Ok(removed)
    }
}
