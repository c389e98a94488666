//! Share resolver backed by a JSON manifest file.
//!
//! ```json
//! {
//!   "shares": {
//!     "q3-reports": {
//!       "kind": "folder",
//!       "file_name": "Q3 Reports",
//!       "entries": [{ "name": "summary.pdf", "url": "https://files.example.com/1" }],
//!       "visible_to": ["alice", "bob"],
//!       "download_allowed": ["alice"]
//!     }
//!   }
//! }
//! ```
//!
//! An empty `visible_to` makes a share visible to every authenticated user,
//! and an empty `download_allowed` lets everyone who can see it download it.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use super::{ResolveError, ShareDownloadInfo, ShareResolver};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read share manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse share manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Share '{reference}' has an invalid URL: {url}")]
    InvalidUrl { reference: String, url: String },
}

/// A share as stored in the manifest, with its access lists.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestShare {
    #[serde(flatten)]
    pub info: ShareDownloadInfo,

    #[serde(default)]
    pub visible_to: Vec<String>,

    #[serde(default)]
    pub download_allowed: Vec<String>,
}

impl ManifestShare {
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.visible_to.is_empty() || self.visible_to.iter().any(|u| u == user_id)
    }

    pub fn allows_download(&self, user_id: &str) -> bool {
        self.download_allowed.is_empty() || self.download_allowed.iter().any(|u| u == user_id)
    }

    fn urls(&self) -> Vec<&str> {
        match &self.info {
            ShareDownloadInfo::File { url, .. } => vec![url.as_str()],
            ShareDownloadInfo::Folder { entries, .. } => {
                entries.iter().map(|e| e.url.as_str()).collect()
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareManifest {
    #[serde(default)]
    pub shares: HashMap<String, ManifestShare>,
}

impl ShareManifest {
    /// Parse and validate a manifest from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        let manifest: ShareManifest = serde_json::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read a manifest file from disk.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Every backing URL must be an absolute http(s) URL.
    fn validate(&self) -> Result<(), ManifestError> {
        for (reference, share) in &self.shares {
            for url in share.urls() {
                let valid = Url::parse(url)
                    .map(|u| matches!(u.scheme(), "http" | "https"))
                    .unwrap_or(false);
                if !valid {
                    return Err(ManifestError::InvalidUrl {
                        reference: reference.clone(),
                        url: url.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// [`ShareResolver`] over an in-memory [`ShareManifest`].
pub struct ManifestResolver {
    manifest: ShareManifest,
}

impl ManifestResolver {
    pub fn new(manifest: ShareManifest) -> Self {
        Self { manifest }
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let manifest = ShareManifest::load(path)?;
        log::debug!("Loaded {} shares from {}", manifest.len(), path.display());
        Ok(Self::new(manifest))
    }

    pub fn share_count(&self) -> usize {
        self.manifest.len()
    }
}

#[async_trait]
impl ShareResolver for ManifestResolver {
    async fn resolve_share_for_download(
        &self,
        share_ref: &str,
        user_id: &str,
    ) -> Result<ShareDownloadInfo, ResolveError> {
        let share = self
            .manifest
            .shares
            .get(share_ref)
            .filter(|share| share.is_visible_to(user_id))
            .ok_or(ResolveError::NotFound)?;

        if !share.allows_download(user_id) {
            return Err(ResolveError::Forbidden);
        }

        Ok(share.info.clone())
    }
}
