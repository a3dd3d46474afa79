use crate::clients::{ClusterApi, FormatConverter};
use crate::error::{AppError, MaterializeError, ResourceError};
use crate::models::ResourceKind;
use crate::repository::SolutionRepository;
use crate::services::RenderedResource;
use std::sync::Arc;

/// Submits rendered resources to the cluster and records what the instance now owns.
#[derive(Clone)]
pub struct Materializer {
    cluster: Arc<dyn ClusterApi>,
    converter: Option<Arc<dyn FormatConverter>>,
    ledger: SolutionRepository,
}

impl Materializer {
    pub fn new(
        cluster: Arc<dyn ClusterApi>,
        converter: Option<Arc<dyn FormatConverter>>,
        ledger: SolutionRepository,
    ) -> Self {
        Self {
            cluster,
            converter,
            ledger,
        }
    }

    /// Only a broken ledger transaction is fatal; everything else fails this entry alone.
    pub async fn materialize(
        &self,
        instance_id: &str,
        namespace: &str,
        kind: ResourceKind,
        file: &str,
        resource: &RenderedResource,
    ) -> Result<(), MaterializeError> {
        let fail = |cause: String| ResourceError::MaterializeFailed {
            kind,
            name: file.to_string(),
            cause,
        };

        let document = match &self.converter {
            Some(converter) => converter
                .convert(kind, &resource.document)
                .await
                .map_err(|e| fail(format!("conversion failed: {}", e)))?,
            None => resource.document.clone(),
        };

        self.cluster
            .create(kind, namespace, &document)
            .await
            .map_err(|e| fail(e.to_string()))?;

        match self
            .ledger
            .record_owned_resource(instance_id, kind, &resource.name)
            .await
        {
            Ok(()) => {
                tracing::info!("Created {} {} in {}", kind, resource.name, namespace);
                Ok(())
            }
            Err(AppError::ResourceAlreadyExists(_)) => Err(ResourceError::AlreadyExists {
                kind,
                name: file.to_string(),
            }
            .into()),
            Err(err @ AppError::LedgerTransaction(_)) => Err(MaterializeError::Ledger(err)),
            Err(err) => Err(fail(err.to_string()).into()),
        }
    }
}
