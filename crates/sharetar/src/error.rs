use thiserror::Error;

use crate::http::FetchError;
use crate::share::ResolveError;

#[derive(Error, Debug)]
pub enum DownloadError {
    // Caller errors
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Share not found")]
    NotFound,

    #[error("Access to share denied")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    // Upstream errors
    #[error("Failed to fetch shared file: {0}")]
    Fetch(#[from] FetchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DownloadError {
    /// HTTP status the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DownloadError::Unauthenticated => 401,
            DownloadError::NotFound => 404,
            DownloadError::Forbidden => 403,
            DownloadError::BadRequest(_) => 400,
            DownloadError::Fetch(_) => 502,
            DownloadError::Internal(_) => 500,
        }
    }

    /// Message safe to show to the caller. Never contains upstream URLs.
    pub fn public_message(&self) -> String {
        match self {
            DownloadError::Unauthenticated => "Authentication required".to_string(),
            DownloadError::NotFound => "Share not found".to_string(),
            DownloadError::Forbidden => "You do not have access to this share".to_string(),
            DownloadError::BadRequest(message) => message.clone(),
            DownloadError::Fetch(_) => "Failed to retrieve shared file".to_string(),
            DownloadError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Server-side failures that get logged with full detail.
    pub fn is_server_error(&self) -> bool {
        matches!(self, DownloadError::Fetch(_) | DownloadError::Internal(_))
    }
}

impl From<ResolveError> for DownloadError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound => DownloadError::NotFound,
            ResolveError::Forbidden => DownloadError::Forbidden,
            ResolveError::Internal(message) => DownloadError::Internal(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
