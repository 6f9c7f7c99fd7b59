use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::HarvestError;
use crate::normalize::{param_url, MatchMode};

/// CPU-bound classification stage shared by every domain task.
///
/// One pool serves the whole run so the number of filter threads stays fixed
/// no matter how many domains are in flight.
pub struct ParamFilter {
    pool: ThreadPool,
    mode: MatchMode,
}

impl ParamFilter {
    pub fn new(workers: usize, mode: MatchMode) -> Result<Self, HarvestError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("param-filter-{index}"))
            .build()?;
        Ok(Self { pool, mode })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Normalized form of every parameterized URL in `urls`, in input order.
    pub fn filter(&self, urls: &[String]) -> Vec<String> {
        let start_time = Instant::now();
        let mode = self.mode;

        // Indexed collect keeps the input order.
        let matched: Vec<String> = self
            .pool
            .install(|| urls.par_iter().filter_map(|url| param_url(url, mode)).collect());

        debug!(
            action = "complete",
            component = "param_filter",
            input_count = urls.len(),
            matched_count = matched.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Filtered URLs"
        );
        matched
    }
}
