//! Fetch command - download one share to disk.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::{Path, PathBuf};

use crate::config::SharetarConfig;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Share reference to download
    #[arg(value_name = "SHARE")]
    pub share_ref: String,

    /// User to download as
    #[arg(short, long)]
    pub user: String,

    /// Share manifest (JSON)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Output file (defaults to the share's file name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Where to write the download: the explicit output path, or the suggested
/// name inside the current directory.
fn output_path(output: Option<PathBuf>, suggested: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(suggested),
        Some(path) => path,
        None => Path::new(".").join(suggested),
    }
}

pub async fn execute(args: FetchArgs, config: Option<&SharetarConfig>) -> Result<i32> {
    let manifest = crate::resolve_manifest_path(args.manifest, config);
    let service = crate::build_service(&manifest, config)?;

    let download = match service.handle_download(&args.share_ref, Some(&args.user)).await {
        Ok(download) => download,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e.public_message());
            return Ok(1);
        }
    };

    let dest = output_path(args.output, &download.file_name);
    tokio::fs::write(&dest, &download.body)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    println!(
        "{} Wrote {} ({} bytes, {})",
        style("✓").green(),
        dest.display(),
        download.body.len(),
        download.content_type
    );

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_defaults_to_suggested_name() {
        assert_eq!(output_path(None, "Team.tar"), PathBuf::from("./Team.tar"));
    }

    #[test]
    fn test_output_path_explicit_file() {
        assert_eq!(
            output_path(Some(PathBuf::from("/tmp/out.bin")), "Team.tar"),
            PathBuf::from("/tmp/out.bin")
        );
    }

    #[test]
    fn test_output_path_directory() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            output_path(Some(temp.path().to_path_buf()), "Team.tar"),
            temp.path().join("Team.tar")
        );
    }

    #[tokio::test]
    async fn test_fetch_unknown_share_exits_with_error_code() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("shares.json");
        std::fs::write(&manifest, r#"{"shares": {}}"#).unwrap();

        let args = FetchArgs {
            share_ref: "missing".to_string(),
            user: "alice".to_string(),
            manifest: Some(manifest),
            output: Some(temp.path().join("out")),
        };

        assert_eq!(execute(args, None).await.unwrap(), 1);
        assert!(!temp.path().join("out").exists());
    }
}
