use cxfer_core::{
    DestinationRegistry, Migration, MigrationOutcome, RunOutcome, SourceRegistry, TransferConfig,
};
use cxfer_registry::{CatalogStore, SourceCatalog};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const DEMO_SEED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/mock_data.json");

fn migration(store: &CatalogStore, config: TransferConfig) -> Migration {
    let source: Arc<dyn SourceRegistry> = Arc::new(SourceCatalog::load(DEMO_SEED).unwrap());
    let destination: Arc<dyn DestinationRegistry> = Arc::new(store.clone());
    Migration::new(source, destination, config)
}

#[tokio::test(start_paused = true)]
async fn test_demo_seed_transfers_with_default_policies() {
    let store = CatalogStore::new();
    let started = tokio::time::Instant::now();

    let report = migration(&store, TransferConfig::new()).run().await.unwrap();

    assert_eq!(
        report.outcome,
        MigrationOutcome::Run(RunOutcome::Completed {
            layers: 3,
            transferred: 5
        })
    );
    // Completion after 10s is first seen by the poll at 14s, once per layer
    assert_eq!(started.elapsed(), Duration::from_secs(3 * 14));
    assert_eq!(store.len(), 5);
    assert!(store.status("EntryGroup", "eg-archive").unwrap().finished);
}

#[tokio::test(start_paused = true)]
async fn test_demo_seed_dry_run_plans_three_layers() {
    let store = CatalogStore::new();

    let report = migration(&store, TransferConfig::new().with_dry_run(true))
        .run()
        .await
        .unwrap();

    let layers: Vec<Vec<&str>> = report
        .plan
        .resolution
        .layers
        .iter()
        .map(|layer| layer.ids().map(|id| id.as_str()).collect())
        .collect();
    assert_eq!(
        layers,
        vec![
            vec!["eg-sales", "eg-marketing"],
            vec!["tt-pii", "tt-retention"],
            vec!["eg-archive"],
        ]
    );
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_destination_times_out() {
    // Completion lands after the last of the five polls (at 30s)
    let store = CatalogStore::new().with_completion_delay(Duration::from_secs(120));

    let report = migration(&store, TransferConfig::new()).run().await.unwrap();

    let MigrationOutcome::Run(RunOutcome::Aborted { layer, error, .. }) = report.outcome else {
        panic!("expected aborted run, got {:?}", report.outcome);
    };
    assert_eq!(layer, 0);
    assert_eq!(error.kind, cxfer_core::TransferErrorKind::Timeout);
    assert!(store.status("TagTemplate", "tt-pii").is_err());
}
