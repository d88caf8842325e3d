//! The ordered fold every stage is built on.
//!
//! Resources are visited left to right. A resource whose predicate declines
//! leaves the accumulator untouched; one that accepts replaces it with the
//! action's output. Nothing short-circuits: every resource is asked, even
//! after an earlier one acted. The first failing action aborts the fold.

use async_trait::async_trait;

use crate::observability::metrics;
use crate::pipeline::PipelineError;
use crate::resource::{Capability, Resource, ResourceError, ResourceRegistry};

/// A predicate + action pair over one accumulator type.
#[async_trait]
pub trait Stage: Send + Sync {
    type Acc: Send + Sync;

    /// Capability a resource must declare to take part in this stage.
    const CAPABILITY: Capability;

    async fn applies(&self, resource: &dyn Resource, acc: &Self::Acc) -> bool;

    async fn apply(&self, resource: &dyn Resource, acc: Self::Acc) -> Result<Self::Acc, ResourceError>;
}

/// Fold `seed` through every resource in `registry`, in order.
pub async fn fold<S: Stage>(
    stage: &S,
    registry: &ResourceRegistry,
    seed: S::Acc,
) -> Result<S::Acc, PipelineError> {
    let stage_name = S::CAPABILITY;
    let mut acc = seed;

    for entry in registry.iter() {
        if !entry.capabilities().contains(stage_name) {
            continue;
        }
        if !stage.applies(entry.handler(), &acc).await {
            continue;
        }

        tracing::debug!(stage = %stage_name, resource = %entry.name(), "Resource applied");
        metrics::record_resource_invocation(stage_name.as_str(), entry.name());

        acc = stage
            .apply(entry.handler(), acc)
            .await
            .map_err(|source| {
                metrics::record_pipeline_failure(stage_name.as_str());
                PipelineError::Resource {
                    stage: stage_name,
                    resource: entry.name().to_string(),
                    source,
                }
            })?;
    }

    Ok(acc)
}
