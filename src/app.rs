//! Command-line entry point shared by the `catalog_sync` binary.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, error::ErrorKind};
use tracing::warn;

use crate::config::SyncConfig;
use crate::constants::catalog::{DEFAULT_CATALOG_URL, DEFAULT_CATEGORY};
use crate::constants::output::DEFAULT_OUTPUT_DIR;
use crate::constants::state::DEFAULT_STATE_FILENAME;
use crate::constants::sync::{DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::metrics::SyncReport;
use crate::sync::SyncOrchestrator;

#[derive(Debug, Parser)]
#[command(
    name = "catalog_sync",
    disable_help_subcommand = true,
    about = "Mirror changed catalog datasets with normalized CSV headers",
    long_about = "List the catalog, download only datasets whose version marker changed since the last run, rewrite their header rows to snake_case, and persist the sync state once every download has finished.",
    after_help = "Every option falls back to its CATALOG_SYNC_* environment variable, then to the built-in default."
)]
struct SyncCli {
    #[arg(
        long,
        env = "CATALOG_SYNC_CATALOG_URL",
        default_value = DEFAULT_CATALOG_URL,
        help = "Endpoint listing every catalog item"
    )]
    catalog_url: String,
    #[arg(
        long,
        env = "CATALOG_SYNC_CATEGORY",
        default_value = DEFAULT_CATEGORY,
        help = "Catalog theme a dataset must carry to be mirrored"
    )]
    category: String,
    #[arg(
        long,
        env = "CATALOG_SYNC_MAX_CONCURRENCY",
        default_value_t = DEFAULT_MAX_CONCURRENCY,
        value_parser = parse_positive_usize,
        help = "Maximum simultaneous dataset downloads"
    )]
    max_concurrency: usize,
    #[arg(
        long,
        env = "CATALOG_SYNC_OUTPUT_DIR",
        value_name = "PATH",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory receiving mirrored CSV files"
    )]
    output_dir: PathBuf,
    #[arg(
        long,
        env = "CATALOG_SYNC_STATE_PATH",
        value_name = "PATH",
        default_value = DEFAULT_STATE_FILENAME,
        help = "JSON file holding the persisted sync state"
    )]
    state_path: PathBuf,
    #[arg(
        long = "timeout-secs",
        env = "CATALOG_SYNC_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS,
        help = "Per-request timeout in seconds, response body included"
    )]
    timeout_secs: u64,
}

impl SyncCli {
    fn into_config(self) -> SyncConfig {
        SyncConfig {
            catalog_url: self.catalog_url,
            category: self.category,
            max_concurrency: self.max_concurrency,
            output_dir: self.output_dir,
            state_path: self.state_path,
            request_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Parse `args_iter` (without the program name), run one pass, and log the report.
///
/// `--help` and `--version` print and return `Ok(None)`.
pub fn run_sync_cli<I>(args_iter: I) -> Result<Option<SyncReport>, Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<SyncCli, _>(std::iter::once("catalog_sync".to_string()).chain(args_iter))?
    else {
        return Ok(None);
    };

    let orchestrator = SyncOrchestrator::from_config(cli.into_config())?;
    let report = orchestrator.run_once()?;
    for (dataset_id, reason) in &report.failures {
        warn!(dataset_id = %dataset_id, "[catalog_sync] will retry next run: {reason}");
    }
    Ok(Some(report))
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("expected a positive integer, got '{raw}'"))?;
    if parsed == 0 {
        return Err("--max-concurrency must be greater than zero".to_string());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<SyncCli>, Box<dyn Error>> {
        parse_cli::<SyncCli, _>(
            std::iter::once("catalog_sync").chain(args.iter().copied()),
        )
    }

    #[test]
    fn cli_flags_override_defaults() {
        let cli = parse(&[
            "--category",
            "Nursing homes",
            "--max-concurrency",
            "2",
            "--output-dir",
            "/tmp/out",
            "--state-path",
            "/tmp/state.json",
            "--timeout-secs",
            "9",
        ])
        .unwrap()
        .unwrap();
        let config = cli.into_config();
        assert_eq!(config.category, "Nursing homes");
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.state_path, PathBuf::from("/tmp/state.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(9));
    }

    #[test]
    fn cli_rejects_zero_concurrency() {
        let err = parse(&["--max-concurrency", "0"]).err().unwrap();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn help_returns_none() {
        assert!(parse(&["--help"]).unwrap().is_none());
    }

    #[test]
    fn parse_positive_usize_rejects_garbage() {
        assert_eq!(parse_positive_usize("3"), Ok(3));
        assert!(parse_positive_usize("-1").is_err());
        assert!(parse_positive_usize("many").is_err());
    }
}
