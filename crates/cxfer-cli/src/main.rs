//! cxfer - transfer catalog resources between registries in dependency order
//!
//! | Command | Description |
//! |---------|-------------|
//! | `transfer` | Load, validate, layer and transfer every resource |
//! | `serve-mock` | Serve a local source + destination catalog |
//!
//! Exit status is 0 for a completed transfer or a dry run, 1 otherwise.

mod cli;
mod logging;

use anyhow::Context;
use cli::{Action, Invocation};
use cxfer_core::{
    Migration, MigrationOutcome, MigrationReport, ResourceId, RunOutcome, TransferConfig,
};
use cxfer_registry::{
    CatalogStore, DestinationHttpClient, MockState, SourceCatalog, SourceHttpClient,
};
use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    let invocation = cli::parse_from(std::env::args_os()).unwrap_or_else(|err| err.exit());
    let _guard = match logging::init(invocation.verbose) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(invocation).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(invocation: Invocation) -> anyhow::Result<ExitCode> {
    let config = load_config(invocation.config.as_deref())?;

    match invocation.action {
        Action::Transfer(overrides) => transfer(overrides.apply(config)).await,
        Action::ServeMock {
            data,
            bind,
            completion_delay,
        } => {
            serve_mock(&data, bind, completion_delay).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<TransferConfig> {
    let Some(path) = path else {
        return Ok(TransferConfig::default());
    };
    TransferConfig::load(path)
        .with_context(|| format!("loading configuration from {}", path.display()))
}

async fn transfer(config: TransferConfig) -> anyhow::Result<ExitCode> {
    tracing::info!(
        endpoint = %config.endpoint,
        dry_run = config.dry_run,
        ignore_validation_errors = config.ignore_validation_errors,
        "starting catalog transfer"
    );

    let source =
        SourceHttpClient::from_config(&config).context("creating source registry client")?;
    let destination = DestinationHttpClient::from_config(&config)
        .context("creating destination registry client")?;

    let report = Migration::new(Arc::new(source), Arc::new(destination), config)
        .run()
        .await
        .context("catalog transfer stopped before transferring anything")?;

    log_report(&report);
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn log_report(report: &MigrationReport) {
    let resolution = &report.plan.resolution;

    match &report.outcome {
        MigrationOutcome::DryRun => {
            for (index, layer) in resolution.layers.iter().enumerate() {
                let ids: Vec<&str> = layer.ids().map(ResourceId::as_str).collect();
                tracing::info!(layer = index + 1, ?ids, "planned layer");
            }
            tracing::info!(
                layers = resolution.layers.len(),
                resources = resolution.resource_count(),
                "dry run finished, nothing was transferred"
            );
        }
        MigrationOutcome::Run(RunOutcome::Completed {
            layers,
            transferred,
        }) => {
            tracing::info!(layers, transferred, "all data successfully transferred");
        }
        MigrationOutcome::Run(RunOutcome::Aborted {
            layer,
            transferred,
            error,
        }) => {
            tracing::error!(
                layer = layer + 1,
                transferred,
                %error,
                "transfer aborted, later layers were not attempted"
            );
        }
    }
}

async fn serve_mock(
    data: &Path,
    bind: SocketAddr,
    completion_delay: Duration,
) -> anyhow::Result<()> {
    let source = SourceCatalog::load(data)
        .with_context(|| format!("loading mock catalog seed {}", data.display()))?;
    let store = CatalogStore::new().with_completion_delay(completion_delay);

    cxfer_registry::serve(bind, MockState::new(source, store))
        .await
        .with_context(|| format!("serving mock catalog on {bind}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn config_file_combines_with_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"http://registry:8080/\"").unwrap();
        writeln!(file, "[poll]").unwrap();
        writeln!(file, "max_attempts = 3").unwrap();

        let path = file.path().to_str().unwrap();
        let invocation = cli::parse_from(["cxfer", "--config", path, "transfer", "-d"]).unwrap();
        let Action::Transfer(overrides) = invocation.action else {
            panic!("expected transfer");
        };

        let config = overrides.apply(load_config(invocation.config.as_deref()).unwrap());

        assert!(config.dry_run);
        assert_eq!(config.endpoint, "http://registry:8080/");
        assert_eq!(config.poll.max_attempts, 3);
    }

    #[test]
    fn missing_config_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();

        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn no_config_file_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), TransferConfig::default());
    }
}
