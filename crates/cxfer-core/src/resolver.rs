//! Dependency resolution
//!
//! Computes the transfer plan: an ordered sequence of layers in which every
//! dependency of a resource sits in a strictly earlier layer.
//!
//! ## Algorithm
//!
//! Kahn-style layering over a reference table with poison propagation:
//!
//! 1. Every identifier seen as a resource or as a dependency gets a node
//!    holding its unresolved dependency count (`outbound`) and the
//!    identifiers depending on it (`backrefs`).
//! 2. Identifiers that are referenced but never supplied are **missing**.
//!    They have no dependencies of their own, so they start in layer 0.
//! 3. Processing a layer releases its backrefs. A backref of a missing
//!    identifier becomes missing too, so absence propagates transitively.
//! 4. A layer is emitted with the supplied, non-missing members only.
//!    Propagation happens before emitting.
//! 5. Supplied identifiers never reached are stuck in a **cycle**.
//!
//! Resolution problems are reported in [`Resolution`], never raised.

use crate::types::{Layer, Resource, ResourceId};
use indexmap::{IndexMap, IndexSet};

/// Resolver bookkeeping for one identifier
#[derive(Debug, Default)]
struct RefNode {
    /// Dependencies not yet released
    outbound: usize,
    /// Identifiers depending on this one
    backrefs: Vec<ResourceId>,
}

/// Output of dependency resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Non-empty layers in execution order
    pub layers: Vec<Layer>,
    /// Absent identifiers and everything transitively depending on them
    pub missing: IndexSet<ResourceId>,
    /// Supplied identifiers stuck in a dependency cycle
    pub cyclic: IndexSet<ResourceId>,
    /// Supplied identifiers placed in some layer
    pub valid: IndexSet<ResourceId>,
}

impl Resolution {
    /// Number of resources across all layers
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Whether every resource of a batch of `batch_len` was placed
    #[inline]
    #[must_use]
    pub fn is_complete(&self, batch_len: usize) -> bool {
        self.resource_count() == batch_len
    }

    /// Index of the layer holding `id`, if any
    #[must_use]
    pub fn layer_of(&self, id: &str) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.ids().any(|member| member.as_str() == id))
    }
}

/// Layered dependency resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyResolver;

impl DependencyResolver {
    /// Create resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve a batch into transfer layers
    ///
    /// The batch is expected to be deduplicated. If an identifier still
    /// repeats, the last record wins and the dependency counts of every
    /// occurrence are merged.
    ///
    /// # Arguments
    /// * `resources` - The batch, in source order
    ///
    /// # Returns
    /// Layers plus the missing, cyclic and valid identifier sets
    #[must_use]
    pub fn resolve(&self, resources: &[Resource]) -> Resolution {
        // Position in batch for every supplied identifier
        let batch: IndexMap<&ResourceId, (usize, &Resource)> = resources
            .iter()
            .enumerate()
            .map(|(position, r)| (&r.id, (position, r)))
            .collect();

        let mut nodes = build_ref_table(resources);

        let mut missing: IndexSet<ResourceId> = nodes
            .keys()
            .filter(|id| !batch.contains_key(id))
            .cloned()
            .collect();

        let mut layer: Vec<ResourceId> = nodes
            .iter()
            .filter(|(_, node)| node.outbound == 0)
            .map(|(id, _)| id.clone())
            .collect();

        let mut visited: IndexSet<ResourceId> = IndexSet::with_capacity(resources.len());
        let mut layers = Vec::new();

        while !layer.is_empty() {
            let mut next_layer: IndexSet<ResourceId> = IndexSet::new();

            for id in &layer {
                // A node enters a layer exactly once, so its backrefs are released once
                let backrefs = nodes
                    .get_mut(id)
                    .map(|node| std::mem::take(&mut node.backrefs))
                    .unwrap_or_default();
                let poisoned = missing.contains(id);

                for backref in backrefs {
                    if poisoned {
                        missing.insert(backref.clone());
                    }
                    if let Some(dependent) = nodes.get_mut(&backref) {
                        dependent.outbound = dependent.outbound.saturating_sub(1);
                        if dependent.outbound == 0 {
                            next_layer.insert(backref);
                        }
                    }
                }

                if batch.contains_key(id) {
                    visited.insert(id.clone());
                }
            }

            let mut members: Vec<(usize, &Resource)> = layer
                .iter()
                .filter(|id| visited.contains(*id) && !missing.contains(*id))
                .filter_map(|id| batch.get(id).copied())
                .collect();
            members.sort_by_key(|(position, _)| *position);

            if !members.is_empty() {
                tracing::trace!(layer = layers.len(), size = members.len(), "layer resolved");
                layers.push(Layer::new(
                    members.into_iter().map(|(_, r)| r.clone()).collect(),
                ));
            }

            layer = next_layer.into_iter().collect();
        }

        let cyclic: IndexSet<ResourceId> = batch
            .keys()
            .filter(|id| !visited.contains(**id) && !missing.contains(**id))
            .map(|id| (*id).clone())
            .collect();

        let valid: IndexSet<ResourceId> = batch
            .keys()
            .filter(|id| visited.contains(**id) && !missing.contains(**id))
            .map(|id| (*id).clone())
            .collect();

        let resolution = Resolution {
            layers,
            missing,
            cyclic,
            valid,
        };
        log_resolution(&resolution, batch.len());
        resolution
    }
}

/// Build the reference table in first-appearance order
fn build_ref_table(resources: &[Resource]) -> IndexMap<ResourceId, RefNode> {
    let mut nodes: IndexMap<ResourceId, RefNode> = IndexMap::with_capacity(resources.len());

    for resource in resources {
        nodes.entry(resource.id.clone()).or_default();

        for dependency in &resource.dependencies {
            nodes
                .entry(dependency.clone())
                .or_default()
                .backrefs
                .push(resource.id.clone());
            if let Some(node) = nodes.get_mut(&resource.id) {
                node.outbound += 1;
            }
        }
    }

    nodes
}

fn log_resolution(resolution: &Resolution, batch_len: usize) {
    if resolution.valid.len() < batch_len {
        tracing::info!(
            valid = resolution.valid.len(),
            batch = batch_len,
            "some resources cannot be placed in the transfer plan"
        );
    }
    if !resolution.missing.is_empty() {
        tracing::info!(ids = ?resolution.missing, "missing dependencies");
    }
    if !resolution.cyclic.is_empty() {
        tracing::info!(ids = ?resolution.cyclic, "elements forming cycles");
    }
    if !resolution.valid.is_empty() {
        tracing::info!(
            ids = ?resolution.valid,
            layers = resolution.layers.len(),
            "valid resources acceptable for transfer"
        );
    }
}
