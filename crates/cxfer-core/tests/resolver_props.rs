use cxfer_core::{DependencyResolver, Resource, ResourceId, ResourceType};
use cxfer_test_utils::{entry_group, tag_template};
use proptest::prelude::*;
use std::collections::HashMap;

/// Batch of `node_count` resources named `r*`
///
/// A closed batch only has edges to earlier resources. An open one may also
/// form cycles and reference absent `x*` identifiers.
fn batch(edges: &[(usize, usize)], node_count: usize, closed: bool) -> Vec<Resource> {
    let mut deps: Vec<Vec<String>> = vec![Vec::new(); node_count];
    for &(from, to) in edges {
        if from >= node_count {
            continue;
        }
        if closed {
            if to < from {
                deps[from].push(format!("r{to}"));
            }
        } else if to >= node_count {
            deps[from].push(format!("x{to}"));
        } else {
            deps[from].push(format!("r{to}"));
        }
    }

    deps.into_iter()
        .enumerate()
        .map(|(i, d)| {
            let resource_type = if i % 2 == 0 {
                ResourceType::EntryGroup
            } else {
                ResourceType::TagTemplate
            };
            Resource::new(format!("r{i}"), resource_type).with_dependencies(d)
        })
        .collect()
}

const OPEN: bool = false;
const CLOSED: bool = true;

fn layer_index(resolution: &cxfer_core::Resolution) -> HashMap<ResourceId, usize> {
    resolution
        .layers
        .iter()
        .enumerate()
        .flat_map(|(index, layer)| layer.ids().map(move |id| (id.clone(), index)))
        .collect()
}

proptest! {
    #[test]
    fn prop_every_resource_lands_in_exactly_one_bucket(
        node_count in 1..20usize,
        edges in proptest::collection::vec((0..20usize, 0..24usize), 0..40)
    ) {
        let resources = batch(&edges, node_count, OPEN);
        let resolution = DependencyResolver::new().resolve(&resources);
        let placed = layer_index(&resolution);

        for resource in &resources {
            let buckets = [
                placed.contains_key(&resource.id),
                resolution.missing.contains(&resource.id),
                resolution.cyclic.contains(&resource.id),
            ];
            prop_assert_eq!(buckets.iter().filter(|b| **b).count(), 1, "{}", resource.id);
        }
        prop_assert_eq!(placed.len(), resolution.valid.len());
        prop_assert!(resolution.layers.iter().all(|layer| !layer.is_empty()));
    }

    #[test]
    fn prop_dependencies_precede_dependents(
        node_count in 1..20usize,
        edges in proptest::collection::vec((0..20usize, 0..24usize), 0..40)
    ) {
        let resources = batch(&edges, node_count, OPEN);
        let resolution = DependencyResolver::new().resolve(&resources);
        let placed = layer_index(&resolution);

        for layer in &resolution.layers {
            for resource in layer {
                let own = placed[&resource.id];
                for dependency in &resource.dependencies {
                    let dep_layer = placed.get(dependency);
                    prop_assert!(
                        dep_layer.is_some_and(|l| *l < own),
                        "{} -> {}",
                        resource.id,
                        dependency
                    );
                }
            }
        }
    }

    #[test]
    fn prop_acyclic_complete_batch_is_fully_placed(
        node_count in 1..20usize,
        edges in proptest::collection::vec((0..20usize, 0..20usize), 0..40)
    ) {
        let resources = batch(&edges, node_count, CLOSED);
        let resolution = DependencyResolver::new().resolve(&resources);

        prop_assert!(resolution.is_complete(resources.len()));
        prop_assert!(resolution.missing.is_empty());
        prop_assert!(resolution.cyclic.is_empty());
    }

    #[test]
    fn prop_layers_keep_batch_order(
        node_count in 1..20usize,
        edges in proptest::collection::vec((0..20usize, 0..20usize), 0..40)
    ) {
        let resources = batch(&edges, node_count, CLOSED);
        let position: HashMap<&ResourceId, usize> =
            resources.iter().enumerate().map(|(i, r)| (&r.id, i)).collect();
        let resolution = DependencyResolver::new().resolve(&resources);

        for layer in &resolution.layers {
            let order: Vec<usize> = layer.ids().map(|id| position[id]).collect();
            let mut sorted = order.clone();
            sorted.sort_unstable();
            prop_assert_eq!(order, sorted);
        }
    }
}

#[test]
fn test_no_dependencies_yields_single_layer() {
    let resources = vec![
        entry_group("eg-1", &[]),
        tag_template("tt-1", &[]),
        entry_group("eg-2", &[]),
    ];

    let resolution = DependencyResolver::new().resolve(&resources);

    assert_eq!(resolution.layers.len(), 1);
    assert_eq!(resolution.layers[0].resources(), resources.as_slice());
}

#[test]
fn test_mixed_types_resolve_across_each_other() {
    let resources = vec![
        tag_template("tt-1", &["eg-1"]),
        entry_group("eg-1", &[]),
        entry_group("eg-2", &["tt-1"]),
    ];

    let resolution = DependencyResolver::new().resolve(&resources);

    assert_eq!(resolution.layer_of("eg-1"), Some(0));
    assert_eq!(resolution.layer_of("tt-1"), Some(1));
    assert_eq!(resolution.layer_of("eg-2"), Some(2));
}
