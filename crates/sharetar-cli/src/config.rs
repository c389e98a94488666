use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sharetar::{DownloadConfig, HttpClientConfig};

pub const CONFIG_FILE_NAME: &str = "sharetar.toml";

/// The sharetar configuration file structure (sharetar.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SharetarConfig {
    /// HTTP server settings for `sharetar serve`
    pub server: ServerConfig,

    /// Where shares are defined
    pub shares: SharesConfig,

    /// Outbound HTTP client settings
    pub http: HttpConfig,

    /// Download behaviour
    pub download: DownloadSection,

    /// Directory the config file was found in
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: Option<String>,

    /// Port to listen on
    pub port: Option<u16>,

    /// Number of request handling threads
    pub workers: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SharesConfig {
    /// Path to the share manifest, relative to the config file
    pub manifest: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadSection {
    /// Maximum parallel fetches per folder download
    pub fetch_concurrency: Option<usize>,
}

impl SharetarConfig {
    /// Load configuration from sharetar.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let content = std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                let mut config: SharetarConfig = toml::from_str(&content)
                    .with_context(|| format!("Invalid {}", config_path.display()))?;
                config.base_dir = Some(current);
                log::debug!("Loaded configuration from {}", config_path.display());
                return Ok(Some(config));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load configuration by searching upward from the current working directory
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    /// Manifest path from the config file, resolved against its directory
    pub fn manifest_path(&self) -> Option<PathBuf> {
        let manifest = PathBuf::from(self.shares.manifest.as_ref()?);
        match &self.base_dir {
            Some(base) if manifest.is_relative() => Some(base.join(manifest)),
            _ => Some(manifest),
        }
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::new();
        if let Some(secs) = self.http.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.http.connect_timeout_secs {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(user_agent) = &self.http.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        if let Some(proxy) = &self.http.proxy {
            config = config.with_proxy(proxy.clone());
        }
        config
    }

    pub fn download_config(&self) -> DownloadConfig {
        let config = DownloadConfig::new();
        match self.download.fetch_concurrency {
            Some(n) => config.with_fetch_concurrency(n),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_config() {
        let config: SharetarConfig = toml::from_str("").unwrap();
        assert!(config.server.host.is_none());
        assert!(config.shares.manifest.is_none());
        assert_eq!(config.download_config().fetch_concurrency, 4);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
workers = 8

[shares]
manifest = "shares.json"

[http]
timeout_secs = 60
connect_timeout_secs = 5
user_agent = "sharetar-test/1.0"
proxy = "http://proxy.internal:3128"

[download]
fetch_concurrency = 2
"#;
        let config: SharetarConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, Some("0.0.0.0".to_string()));
        assert_eq!(config.server.port, Some(9000));
        assert_eq!(config.server.workers, Some(8));

        let http = config.http_client_config();
        assert_eq!(http.timeout, Duration::from_secs(60));
        assert_eq!(http.connect_timeout, Duration::from_secs(5));
        assert_eq!(http.user_agent, "sharetar-test/1.0");
        assert_eq!(http.proxy, Some("http://proxy.internal:3128".to_string()));

        assert_eq!(config.download_config().fetch_concurrency, 2);
        // not loaded from disk, so the path stays as written
        assert_eq!(config.manifest_path(), Some(PathBuf::from("shares.json")));
    }

    #[test]
    fn test_load_searches_upward() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[shares]\nmanifest = \"data/shares.json\"\n",
        )
        .unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = SharetarConfig::load(&nested).unwrap().unwrap();
        assert_eq!(config.manifest_path(), Some(temp.path().join("data/shares.json")));
    }

    #[test]
    fn test_absolute_manifest_path_is_kept() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[shares]\nmanifest = \"/srv/shares.json\"\n",
        )
        .unwrap();

        let config = SharetarConfig::load(temp.path()).unwrap().unwrap();
        assert_eq!(config.manifest_path(), Some(PathBuf::from("/srv/shares.json")));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "[server]\nport = \"nope\"\n").unwrap();

        assert!(SharetarConfig::load(temp.path()).is_err());
    }
}
