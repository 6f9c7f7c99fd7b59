use std::path::PathBuf;
use std::time::Duration;

use crate::domain::Domain;

/// Counts for one finished domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: Domain,
    pub total_urls: usize,
    pub param_urls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFailure {
    pub domain: Domain,
    pub reason: String,
}

/// Run-wide totals, owned and mutated only by the progress aggregator.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunTotals {
    pub total_urls: usize,
    pub param_urls: usize,
    pub domains_completed: usize,
    pub failed: Vec<DomainFailure>,
}

#[derive(Debug)]
pub struct HarvestSummary {
    pub domains: usize,
    pub totals: RunTotals,
    pub elapsed: Duration,
    pub all_urls_path: PathBuf,
    pub param_urls_path: PathBuf,
}
