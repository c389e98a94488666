//! Share download orchestration.
//!
//! [`DownloadService::handle_download`] is the entry point: it resolves a
//! share reference for the requesting user and returns either the single
//! shared file as-is or a tar archive of every file in a shared folder.
//!
//! Folder entries are fetched concurrently (bounded by
//! [`DownloadConfig::fetch_concurrency`]) but always written to the archive
//! in the order the resolver returned them. Any failed fetch fails the whole
//! download; partial archives are never returned.

use chrono::Utc;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use crate::archive::{build_archive, ArchiveEntry, UniqueNames};
use crate::http::{BlobFetcher, FetchedBlob};
use crate::share::{ShareDownloadInfo, ShareEntry, ShareResolver};
use crate::util::{build_attachment_disposition, sanitize_name};
use crate::{DownloadError, Result};

pub const TAR_CONTENT_TYPE: &str = "application/x-tar";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const CACHE_CONTROL: &str = "no-store";

pub const EMPTY_FOLDER_MESSAGE: &str = "Folder has no downloadable files";
pub const MISSING_REFERENCE_MESSAGE: &str = "Missing share reference";

const FILE_FALLBACK_NAME: &str = "shared-file";
const FOLDER_FALLBACK_NAME: &str = "shared-folder";
const TAR_EXTENSION: &str = ".tar";
const DEFAULT_FETCH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Maximum number of folder entries fetched at the same time.
    pub fetch_concurrency: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values below 1 are raised to 1 (strictly sequential fetches).
    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }
}

/// Body and headers of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResponse {
    pub body: Vec<u8>,
    /// Sanitized name the client should save the body as.
    pub file_name: String,
    pub content_type: String,
    pub content_disposition: String,
    pub cache_control: &'static str,
}

impl DownloadResponse {
    fn attachment(body: Vec<u8>, file_name: String, content_type: String) -> Self {
        Self {
            body,
            content_disposition: build_attachment_disposition(&file_name),
            file_name,
            content_type,
            cache_control: CACHE_CONTROL,
        }
    }

    /// Response headers in the order they should be sent.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            ("Content-Type", self.content_type.as_str()),
            ("Content-Disposition", self.content_disposition.as_str()),
            ("Cache-Control", self.cache_control),
        ]
    }
}

pub struct DownloadService {
    resolver: Arc<dyn ShareResolver>,
    fetcher: Arc<dyn BlobFetcher>,
    config: DownloadConfig,
}

impl std::fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DownloadService {
    pub fn new(resolver: Arc<dyn ShareResolver>, fetcher: Arc<dyn BlobFetcher>) -> Self {
        Self::with_config(resolver, fetcher, DownloadConfig::default())
    }

    pub fn with_config(
        resolver: Arc<dyn ShareResolver>,
        fetcher: Arc<dyn BlobFetcher>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Produce the download for `share_ref` on behalf of `requesting_user`.
    ///
    /// `requesting_user` is `None` when the caller could not be identified.
    pub async fn handle_download(
        &self,
        share_ref: &str,
        requesting_user: Option<&str>,
    ) -> Result<DownloadResponse> {
        let result = self.resolve_and_download(share_ref, requesting_user).await;

        match &result {
            Ok(response) => log::info!(
                "Served share {} as {} ({} bytes, {})",
                share_ref,
                response.file_name,
                response.body.len(),
                response.content_type
            ),
            Err(e) if e.is_server_error() => {
                log::error!("Download of share {} failed: {}", share_ref, e)
            }
            Err(e) => log::warn!("Rejected download of share {}: {}", share_ref, e),
        }

        result
    }

    async fn resolve_and_download(
        &self,
        share_ref: &str,
        requesting_user: Option<&str>,
    ) -> Result<DownloadResponse> {
        let user_id = requesting_user
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .ok_or(DownloadError::Unauthenticated)?;

        let share_ref = share_ref.trim();
        if share_ref.is_empty() {
            return Err(DownloadError::BadRequest(MISSING_REFERENCE_MESSAGE.to_string()));
        }

        let info = self
            .resolver
            .resolve_share_for_download(share_ref, user_id)
            .await?;

        match info {
            ShareDownloadInfo::File { file_name, url } => self.download_file(&file_name, &url).await,
            ShareDownloadInfo::Folder { file_name, entries } => {
                self.download_folder(&file_name, &entries).await
            }
        }
    }

    async fn download_file(&self, file_name: &str, url: &str) -> Result<DownloadResponse> {
        let name = sanitize_name(file_name, FILE_FALLBACK_NAME);
        let blob = self.fetcher.fetch_binary(url).await?;

        let content_type = blob
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(DownloadResponse::attachment(blob.bytes, name, content_type))
    }

    async fn download_folder(&self, file_name: &str, entries: &[ShareEntry]) -> Result<DownloadResponse> {
        if entries.is_empty() {
            return Err(DownloadError::BadRequest(EMPTY_FOLDER_MESSAGE.to_string()));
        }

        let (archive_name, root) = archive_names(file_name);
        let mtime = Utc::now().timestamp();

        let mut names = UniqueNames::new();
        let paths: Vec<String> = entries
            .iter()
            .map(|entry| format!("{}/{}", root, names.ensure_unique(&entry.name)))
            .collect();

        let blobs: Vec<FetchedBlob> = stream::iter(
            entries
                .iter()
                .enumerate()
                .map(|(index, entry)| self.fetch_entry(index, entries.len(), entry)),
        )
        .buffered(self.config.fetch_concurrency)
        .try_collect()
        .await?;

        let archive_entries: Vec<ArchiveEntry> = paths
            .into_iter()
            .zip(blobs)
            .map(|(path, blob)| ArchiveEntry::new(path, blob.bytes))
            .collect();

        let body = build_archive(archive_entries, mtime);
        log::debug!("Built {} with {} entries ({} bytes)", archive_name, entries.len(), body.len());

        Ok(DownloadResponse::attachment(body, archive_name, TAR_CONTENT_TYPE.to_string()))
    }

    async fn fetch_entry(&self, index: usize, total: usize, entry: &ShareEntry) -> Result<FetchedBlob> {
        log::debug!("Fetching entry {}/{}: {}", index + 1, total, entry.name);
        Ok(self.fetcher.fetch_binary(&entry.url).await?)
    }
}

/// Archive file name (always ending in `.tar`) and the root directory the
/// entries are placed under.
fn archive_names(file_name: &str) -> (String, String) {
    let base = sanitize_name(file_name, FOLDER_FALLBACK_NAME);

    let has_extension = base.to_ascii_lowercase().ends_with(TAR_EXTENSION);
    let root = if has_extension {
        &base[..base.len() - TAR_EXTENSION.len()]
    } else {
        base.as_str()
    };

    if root.is_empty() {
        return (
            format!("{}{}", FOLDER_FALLBACK_NAME, TAR_EXTENSION),
            FOLDER_FALLBACK_NAME.to_string(),
        );
    }

    let archive_name = if has_extension {
        base.clone()
    } else {
        format!("{}{}", base, TAR_EXTENSION)
    };

    (archive_name, root.to_string())
}
