//! Remote blob retrieval.

mod client;
mod fetcher;

pub use client::{FetchError, HttpClient, HttpClientConfig};
pub use fetcher::{BlobFetcher, FetchedBlob};
