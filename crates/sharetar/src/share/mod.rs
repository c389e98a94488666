//! Share resolution.
//!
//! A share reference resolves, for one requesting user, to either a single
//! file or an ordered list of files making up a folder. Resolution is also
//! where visibility and access are decided.

pub mod manifest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use manifest::{ManifestError, ManifestResolver, ManifestShare, ShareManifest};

/// One file inside a folder share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    /// Display name, not yet sanitized or de-duplicated.
    pub name: String,
    /// Backing URL the bytes are fetched from.
    pub url: String,
}

/// What a share reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShareDownloadInfo {
    File {
        file_name: String,
        url: String,
    },
    Folder {
        /// Archive base name.
        file_name: String,
        #[serde(default)]
        entries: Vec<ShareEntry>,
    },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Share not found")]
    NotFound,

    #[error("Access to share denied")]
    Forbidden,

    #[error("Share lookup failed: {0}")]
    Internal(String),
}

/// Resolves share references to downloadable content for a given user.
#[async_trait]
pub trait ShareResolver: Send + Sync {
    /// Returns [`ResolveError::NotFound`] when the reference does not exist or
    /// is not visible to `user_id`, and [`ResolveError::Forbidden`] when it
    /// is visible but the user may not download it.
    async fn resolve_share_for_download(
        &self,
        share_ref: &str,
        user_id: &str,
    ) -> Result<ShareDownloadInfo, ResolveError>;
}
