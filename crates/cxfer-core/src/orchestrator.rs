//! Layered transfer orchestration
//!
//! Layers run strictly in order. Every resource of a layer is spawned as its
//! own task and the layer is complete only when all of them succeeded.
//!
//! # Abort semantics
//!
//! The first failing transfer aborts the run: no later layer is started.
//! Sibling transfers already spawned in the failing layer are detached, not
//! cancelled. They keep running to their own completion or failure and their
//! outcome is not observed.

use crate::error::{TransferError, TransferErrorKind};
use crate::types::{Layer, ResourceId, ResourceType};
use crate::worker::TransferWorker;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;

/// Outcome of a layered run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every layer transferred
    Completed {
        /// Layers processed
        layers: usize,
        /// Resources transferred
        transferred: usize,
    },
    /// A transfer failed and the remaining layers were skipped
    Aborted {
        /// 0-indexed layer holding the failed transfer
        layer: usize,
        /// Resources confirmed transferred before the abort
        transferred: usize,
        /// The failure that caused the abort
        error: TransferError,
    },
}

impl RunOutcome {
    /// Whether every layer transferred
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Resources confirmed transferred
    #[inline]
    #[must_use]
    pub fn transferred(&self) -> usize {
        match self {
            Self::Completed { transferred, .. } | Self::Aborted { transferred, .. } => *transferred,
        }
    }
}

/// Walks a layer plan, fanning out within each layer
#[derive(Debug, Clone)]
pub struct TransferOrchestrator {
    worker: TransferWorker,
}

impl TransferOrchestrator {
    /// Create orchestrator around a worker
    #[inline]
    #[must_use]
    pub fn new(worker: TransferWorker) -> Self {
        Self { worker }
    }

    /// Transfer every layer in order
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `layers` - Plan produced by the resolver
    ///
    /// # Returns
    /// `Completed` when all layers transferred, otherwise `Aborted` with the
    /// first observed failure
    pub async fn run(&self, layers: &[Layer]) -> RunOutcome {
        tracing::info!(layers = layers.len(), "starting layered transfer");
        let mut transferred = 0;

        for (index, layer) in layers.iter().enumerate() {
            tracing::info!(layer = index + 1, resources = layer.len(), "transferring layer");

            match self.run_layer(layer).await {
                Ok(count) => {
                    transferred += count;
                    tracing::info!(layer = index + 1, "layer data successfully transferred");
                }
                Err((count, error)) => {
                    transferred += count;
                    tracing::error!(
                        layer = index + 1,
                        %error,
                        "unable to transfer resources in layer, aborting"
                    );
                    return RunOutcome::Aborted {
                        layer: index,
                        transferred,
                        error,
                    };
                }
            }
        }

        RunOutcome::Completed {
            layers: layers.len(),
            transferred,
        }
    }

    /// Fan out one layer and wait for it, stopping at the first failure
    ///
    /// Returns the number of transfers confirmed before returning.
    async fn run_layer(&self, layer: &Layer) -> Result<usize, (usize, TransferError)> {
        let mut pending: FuturesUnordered<_> = layer
            .iter()
            .map(|resource| {
                let worker = self.worker.clone();
                let resource = resource.clone();
                let id = resource.id.clone();
                let resource_type = resource.resource_type;
                tokio::spawn(async move { worker.transfer(&resource).await })
                    .map(move |joined| (id, resource_type, joined))
            })
            .collect();

        let mut completed = 0;
        while let Some((id, resource_type, joined)) = pending.next().await {
            match joined {
                Ok(Ok(_receipt)) => completed += 1,
                Ok(Err(error)) => return Err((completed, error)),
                Err(join_error) => {
                    return Err((completed, panicked(id, resource_type, &join_error)));
                }
            }
        }

        // Dropping `pending` on early return detaches the remaining tasks
        Ok(completed)
    }
}

fn panicked(
    id: ResourceId,
    resource_type: ResourceType,
    join_error: &tokio::task::JoinError,
) -> TransferError {
    TransferError::new(
        id,
        resource_type,
        TransferErrorKind::Panicked,
        join_error.to_string(),
    )
}
