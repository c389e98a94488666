mod config;
mod fetch;
mod serve;

use config::SharetarConfig;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use sharetar::{DownloadService, HttpClient, ManifestResolver};

const DEFAULT_MANIFEST: &str = "shares.json";

#[derive(Parser, Debug)]
#[command(name = "sharetar")]
#[command(about = "Download file shares and folder shares as tar archives")]
#[command(version)]
struct Args {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve share downloads over HTTP
    Serve(serve::ServeArgs),

    /// Download a single share to disk
    Fetch(fetch::FetchArgs),
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Pick the manifest path: CLI argument, then config file, then ./shares.json
fn resolve_manifest_path(cli: Option<PathBuf>, config: Option<&SharetarConfig>) -> PathBuf {
    cli.or_else(|| config.and_then(|c| c.manifest_path()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST))
}

/// Wire the manifest resolver and HTTP fetcher into a download service
pub(crate) fn build_service(manifest: &Path, config: Option<&SharetarConfig>) -> Result<DownloadService> {
    let resolver = ManifestResolver::load(manifest)
        .with_context(|| format!("Failed to load shares from {}", manifest.display()))?;
    log::info!("Loaded {} shares from {}", resolver.share_count(), manifest.display());

    let http_config = config.map(|c| c.http_client_config()).unwrap_or_default();
    let client = HttpClient::with_config(http_config).context("Failed to create HTTP client")?;

    let download_config = config.map(|c| c.download_config()).unwrap_or_default();

    Ok(DownloadService::with_config(
        Arc::new(resolver),
        Arc::new(client),
        download_config,
    ))
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Load sharetar.toml config if present
    let config = SharetarConfig::load_from_cwd()?;

    match args.command {
        Commands::Serve(serve_args) => serve::execute(serve_args, config.as_ref()),
        Commands::Fetch(fetch_args) => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;
            rt.block_on(fetch::execute(fetch_args, config.as_ref()))
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            // Print the error chain for debugging
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_manifest_path_precedence() {
        let config: SharetarConfig = toml::from_str("[shares]\nmanifest = \"from-config.json\"\n").unwrap();

        assert_eq!(
            resolve_manifest_path(Some(PathBuf::from("cli.json")), Some(&config)),
            PathBuf::from("cli.json")
        );
        assert_eq!(
            resolve_manifest_path(None, Some(&config)),
            PathBuf::from("from-config.json")
        );
        assert_eq!(resolve_manifest_path(None, None), PathBuf::from(DEFAULT_MANIFEST));
    }

    #[test]
    fn test_build_service_reports_missing_manifest() {
        let err = build_service(Path::new("/nonexistent/shares.json"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to load shares"));
    }
}
