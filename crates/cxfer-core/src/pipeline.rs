//! Migration pipeline
//!
//! Load → deduplicate → resolve → transfer. Validation problems found while
//! planning abort before any network transfer call unless the configuration
//! says to ignore them, in which case only the valid plan is transferred.

use crate::config::TransferConfig;
use crate::dedup::deduplicate;
use crate::error::MigrationError;
use crate::orchestrator::{RunOutcome, TransferOrchestrator};
use crate::registry::{DestinationRegistry, SourceRegistry};
use crate::resolver::{DependencyResolver, Resolution};
use crate::types::{Resource, ResourceId, ResourceType};
use crate::worker::TransferWorker;
use indexmap::IndexSet;
use std::sync::Arc;

/// Validated transfer plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationPlan {
    /// Resources read from the source
    pub loaded: usize,
    /// Identifiers dropped for repeating
    pub duplicates: IndexSet<ResourceId>,
    /// Resolver output for the deduplicated batch
    pub resolution: Resolution,
}

/// How a migration ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Planning only; nothing was submitted
    DryRun,
    /// The plan was executed
    Run(RunOutcome),
}

/// Summary of a finished migration
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationReport {
    /// The plan that was executed (or would have been)
    pub plan: MigrationPlan,
    /// Result of execution
    pub outcome: MigrationOutcome,
}

impl MigrationReport {
    /// Whether the migration ended without failure
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            MigrationOutcome::DryRun => true,
            MigrationOutcome::Run(run) => run.is_success(),
        }
    }
}

/// End-to-end migration between two registries
pub struct Migration {
    source: Arc<dyn SourceRegistry>,
    destination: Arc<dyn DestinationRegistry>,
    config: TransferConfig,
    resolver: DependencyResolver,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Migration {
    /// Create migration
    #[must_use]
    pub fn new(
        source: Arc<dyn SourceRegistry>,
        destination: Arc<dyn DestinationRegistry>,
        config: TransferConfig,
    ) -> Self {
        Self {
            source,
            destination,
            config,
            resolver: DependencyResolver::new(),
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Run the full migration
    ///
    /// # Workflow
    /// 1. Load every resource type from the source
    /// 2. Plan: deduplicate and resolve layers
    /// 3. Stop here on dry run
    /// 4. Transfer layer by layer
    ///
    /// # Errors
    /// - `MigrationError::Load` if the source cannot be listed
    /// - `MigrationError::DuplicateResources` / `UnresolvedResources` when
    ///   planning finds problems and they are not ignored
    ///
    /// Transfer failures do not raise; they are reported as an aborted
    /// [`RunOutcome`] inside the report.
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        let resources = self.load().await?;
        let plan = self.plan(resources)?;

        if self.config.dry_run {
            tracing::info!(
                layers = plan.resolution.layers.len(),
                resources = plan.resolution.resource_count(),
                "dry run, skipping transfer"
            );
            return Ok(MigrationReport {
                plan,
                outcome: MigrationOutcome::DryRun,
            });
        }

        let worker = TransferWorker::new(Arc::clone(&self.destination))
            .with_poll_policy(self.config.poll)
            .with_submit_policy(self.config.submit);
        let outcome = TransferOrchestrator::new(worker)
            .run(&plan.resolution.layers)
            .await;

        Ok(MigrationReport {
            plan,
            outcome: MigrationOutcome::Run(outcome),
        })
    }

    /// Read every resource type from the source, in [`ResourceType::ALL`] order
    ///
    /// # Errors
    /// Returns `MigrationError::Load` on the first failing listing.
    pub async fn load(&self) -> Result<Vec<Resource>, MigrationError> {
        let mut resources = Vec::new();
        for resource_type in ResourceType::ALL {
            let listed = self
                .source
                .list_resources(resource_type)
                .await
                .map_err(|source| MigrationError::Load {
                    resource_type,
                    source,
                })?;
            tracing::debug!(%resource_type, count = listed.len(), "loaded resources");
            resources.extend(listed);
        }
        Ok(resources)
    }

    /// Deduplicate and resolve a batch, enforcing the validation policy
    ///
    /// # Errors
    /// Returns `DuplicateResources` or `UnresolvedResources` unless
    /// `ignore_validation_errors` is set.
    pub fn plan(&self, resources: Vec<Resource>) -> Result<MigrationPlan, MigrationError> {
        let loaded = resources.len();
        let deduplicated = deduplicate(resources);

        if !deduplicated.duplicates.is_empty() {
            tracing::warn!(
                ids = ?deduplicated.duplicates,
                "duplicate resource identifiers found in source data"
            );
            if !self.config.ignore_validation_errors {
                return Err(MigrationError::DuplicateResources {
                    ids: deduplicated.duplicates.into_iter().collect(),
                });
            }
        }

        let resolution = self.resolver.resolve(&deduplicated.resources);

        if !resolution.is_complete(deduplicated.resources.len()) {
            tracing::warn!(
                planned = resolution.resource_count(),
                batch = deduplicated.resources.len(),
                "validation for some of the resources has failed"
            );
            if !self.config.ignore_validation_errors {
                return Err(MigrationError::UnresolvedResources {
                    missing: resolution.missing.iter().cloned().collect(),
                    cyclic: resolution.cyclic.iter().cloned().collect(),
                });
            }
        }

        Ok(MigrationPlan {
            loaded,
            duplicates: deduplicated.duplicates,
            resolution,
        })
    }
}
