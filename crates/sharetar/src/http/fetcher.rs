use async_trait::async_trait;

use super::client::FetchError;

/// Bytes of one remote file plus the content type the remote reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBlob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Retrieves the bytes behind a backing URL.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch_binary(&self, url: &str) -> Result<FetchedBlob, FetchError>;
}
