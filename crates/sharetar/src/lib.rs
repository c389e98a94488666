pub mod archive;
pub mod download;
pub mod error;
pub mod http;
pub mod share;
pub mod util;

pub use error::{DownloadError, Result};
pub use archive::{build_archive, ArchiveEntry, TarBuilder, UniqueNames};
pub use download::{DownloadConfig, DownloadResponse, DownloadService};
pub use http::{BlobFetcher, FetchError, FetchedBlob, HttpClient, HttpClientConfig};
pub use share::{
    ManifestResolver, ResolveError, ShareDownloadInfo, ShareEntry, ShareManifest, ShareResolver,
};
pub use util::{build_attachment_disposition, sanitize_name, truncate_to_byte_budget};
