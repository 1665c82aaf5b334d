//! Command-line definition

use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cxfer_core::TransferConfig;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub(crate) config: Option<PathBuf>,
    pub(crate) verbose: bool,
    pub(crate) action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Transfer(TransferOverrides),
    ServeMock {
        data: PathBuf,
        bind: SocketAddr,
        completion_delay: Duration,
    },
}

/// Flags that take precedence over the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TransferOverrides {
    pub(crate) dry_run: bool,
    pub(crate) ignore_validation_errors: bool,
    pub(crate) endpoint: Option<String>,
}

impl TransferOverrides {
    /// Layer the flags over a loaded configuration
    ///
    /// Flags only ever switch options on; an absent flag keeps the file value.
    pub(crate) fn apply(&self, mut config: TransferConfig) -> TransferConfig {
        if self.dry_run {
            config = config.with_dry_run(true);
        }
        if self.ignore_validation_errors {
            config = config.with_ignore_validation_errors(true);
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        config
    }
}

pub(crate) fn command() -> Command {
    Command::new("cxfer")
        .version(cxfer_core::VERSION)
        .about("Transfer catalog resources between registries in dependency order")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_name("FILE")
                .env("CXFER_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Also print log output to stdout"),
        )
        .subcommand(
            Command::new("transfer")
                .about("Transfer every resource from the source registry to the destination")
                .arg(
                    Arg::new("dry-run")
                        .short('d')
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Resolve and log the transfer plan without transferring anything"),
                )
                .arg(
                    Arg::new("ignore-validation-errors")
                        .short('i')
                        .long("ignore-validation-errors")
                        .action(ArgAction::SetTrue)
                        .help("Transfer the valid subset when duplicates or unresolved dependencies exist"),
                )
                .arg(
                    Arg::new("endpoint")
                        .long("endpoint")
                        .value_name("URL")
                        .env("CXFER_ENDPOINT")
                        .help("Registry base URL"),
                ),
        )
        .subcommand(
            Command::new("serve-mock")
                .about("Serve a mock source and destination catalog over HTTP")
                .arg(
                    Arg::new("data")
                        .long("data")
                        .value_name("FILE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of source records"),
                )
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .value_name("ADDR")
                        .default_value("127.0.0.1:5000")
                        .value_parser(value_parser!(SocketAddr))
                        .help("Listen address"),
                )
                .arg(
                    Arg::new("completion-delay-ms")
                        .long("completion-delay-ms")
                        .value_name("MS")
                        .default_value("10000")
                        .value_parser(value_parser!(u64))
                        .help("Time until an accepted transfer reports finished"),
                ),
        )
}

/// Parse arguments (program name first)
pub(crate) fn parse_from<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = command();
    let matches = command.try_get_matches_from_mut(args)?;
    from_matches(&matches)
        .ok_or_else(|| command.error(ErrorKind::MissingSubcommand, "a subcommand is required"))
}

fn from_matches(matches: &ArgMatches) -> Option<Invocation> {
    let (name, args) = matches.subcommand()?;

    let action = match name {
        "transfer" => Action::Transfer(TransferOverrides {
            dry_run: args.get_flag("dry-run"),
            ignore_validation_errors: args.get_flag("ignore-validation-errors"),
            endpoint: args.get_one::<String>("endpoint").cloned(),
        }),
        "serve-mock" => Action::ServeMock {
            data: args.get_one::<PathBuf>("data")?.clone(),
            bind: *args.get_one::<SocketAddr>("bind")?,
            completion_delay: Duration::from_millis(
                *args.get_one::<u64>("completion-delay-ms")?,
            ),
        },
        _ => return None,
    };

    Some(Invocation {
        config: args.get_one::<PathBuf>("config").cloned(),
        verbose: args.get_flag("verbose"),
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn transfer_flags() {
        let invocation = parse_from(["cxfer", "-v", "transfer", "-d", "-i"]).unwrap();

        assert!(invocation.verbose);
        assert_eq!(invocation.config, None);
        assert_eq!(
            invocation.action,
            Action::Transfer(TransferOverrides {
                dry_run: true,
                ignore_validation_errors: true,
                endpoint: None,
            })
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let invocation = parse_from([
            "cxfer",
            "transfer",
            "--config",
            "cxfer.toml",
            "--verbose",
            "--endpoint",
            "http://registry:8080/",
        ])
        .unwrap();

        assert!(invocation.verbose);
        assert_eq!(invocation.config, Some(PathBuf::from("cxfer.toml")));
        let Action::Transfer(overrides) = invocation.action else {
            panic!("expected transfer");
        };
        assert_eq!(overrides.endpoint.as_deref(), Some("http://registry:8080/"));
    }

    #[test]
    fn serve_mock_defaults() {
        let invocation = parse_from(["cxfer", "serve-mock", "--data", "seed.json"]).unwrap();

        assert_eq!(
            invocation.action,
            Action::ServeMock {
                data: PathBuf::from("seed.json"),
                bind: "127.0.0.1:5000".parse().unwrap(),
                completion_delay: Duration::from_secs(10),
            }
        );
        assert!(!invocation.verbose);
    }

    #[test]
    fn serve_mock_requires_data() {
        let err = parse_from(["cxfer", "serve-mock"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn flags_override_file_values() {
        let file = TransferConfig::new().with_endpoint("http://from-file/");
        let overrides = TransferOverrides {
            dry_run: true,
            ignore_validation_errors: false,
            endpoint: Some("http://from-flag/".to_string()),
        };

        let config = overrides.apply(file);

        assert!(config.dry_run);
        assert!(!config.ignore_validation_errors);
        assert_eq!(config.endpoint, "http://from-flag/");
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let file = TransferConfig::new().with_ignore_validation_errors(true);

        let config = TransferOverrides::default().apply(file.clone());

        assert_eq!(config, file);
    }
}
