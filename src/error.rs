use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the archive index.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("archive index returned HTTP {status}")]
    Status { status: u16 },
}

/// Errors that end a single domain's processing, or the whole run during setup.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("fetch failed for {domain}: {source}")]
    Fetch {
        domain: String,
        #[source]
        source: FetchError,
    },
    #[error("filter worker failed: {0}")]
    Filter(#[from] tokio::task::JoinError),
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to reset {path:?}: {source}")]
    Reset {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to build filter pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("progress aggregator failed: {0}")]
    Aggregator(#[source] tokio::task::JoinError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("domain scheduler closed: {0}")]
    Scheduler(#[from] tokio::sync::AcquireError),
}
