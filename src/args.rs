use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "wayparam",
    about = "Harvest archived URLs for a list of domains and extract the ones carrying query parameters",
    version,
    long_about = None
)]
pub struct Args {
    /// File with one domain per line (prompted for when omitted)
    pub input: Option<PathBuf>,

    /// Output file for every harvested URL
    #[arg(long, default_value = "all_urls.txt")]
    pub all_out: PathBuf,

    /// Output file for parameterized URLs
    #[arg(long, default_value = "param_urls.txt")]
    pub param_out: PathBuf,

    /// Number of domains processed at the same time
    #[arg(short, long, default_value_t = 4)]
    pub concurrency: usize,

    /// Number of filter worker threads (defaults to CPU count)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Read timeout for archive requests, in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Archive index endpoint
    #[arg(long, default_value = crate::config::DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Override the User-Agent header
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Require a real key=value pair in the query component
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
