pub mod args;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod harvest;
pub mod normalize;
pub mod progress;
pub mod sink;
pub mod stats;
pub mod task;
pub mod utils;

pub use args::Args;
pub use config::HarvestConfig;
pub use domain::{load_domains, Domain};
pub use error::{FetchError, HarvestError};
pub use fetcher::{ArchiveSource, UrlStream, WaybackClient};
pub use harvest::{print_summary, run_harvest};
pub use normalize::{is_parameterized, normalize_url, MatchMode};
pub use progress::ProgressMessage;
pub use stats::{DomainReport, HarvestSummary, RunTotals};
