use std::path::PathBuf;
use std::time::Duration;

use crate::args::Args;
use crate::normalize::MatchMode;

pub const DEFAULT_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";
pub const DEFAULT_USER_AGENT: &str = concat!("wayparam/", env!("CARGO_PKG_VERSION"));

/// Runtime settings for a harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Maximum wait between response body chunks.
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    /// Domain tasks allowed to run at once.
    pub concurrency: usize,
    pub filter_workers: usize,
    pub match_mode: MatchMode,
    pub all_urls_path: PathBuf,
    pub param_urls_path: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            read_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
            concurrency: 4,
            filter_workers: num_cpus::get(),
            match_mode: MatchMode::Loose,
            all_urls_path: PathBuf::from("all_urls.txt"),
            param_urls_path: PathBuf::from("param_urls.txt"),
        }
    }
}

impl HarvestConfig {
    pub fn from_args(args: &Args) -> Self {
        let defaults = Self::default();
        Self {
            endpoint: args.endpoint.trim().to_string(),
            user_agent: args
                .user_agent
                .as_ref()
                .map(|ua| ua.trim().to_string())
                .filter(|ua| !ua.is_empty())
                .unwrap_or(defaults.user_agent),
            read_timeout: Duration::from_secs(args.timeout),
            connect_timeout: defaults.connect_timeout,
            concurrency: args.concurrency,
            filter_workers: args.workers.unwrap_or(defaults.filter_workers),
            match_mode: if args.strict {
                MatchMode::Strict
            } else {
                MatchMode::Loose
            },
            all_urls_path: args.all_out.clone(),
            param_urls_path: args.param_out.clone(),
        }
    }
}
