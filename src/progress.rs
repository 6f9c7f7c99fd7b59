//! Progress messages and the single consumer that folds them into run totals.
//!
//! Every domain task holds a [`ProgressSender`] clone. Messages from one
//! sender arrive in the order they were sent; messages from different
//! domains interleave freely. The aggregator stops only on [`ProgressMessage::Done`],
//! which the orchestrator sends after every task has been joined.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::Domain;
use crate::stats::{DomainFailure, RunTotals};
use crate::utils::format_number;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    Partial {
        domain: Domain,
        urls_so_far: usize,
    },
    Complete {
        domain: Domain,
        total_urls: usize,
        total_param_urls: usize,
    },
    Failed {
        domain: Domain,
        reason: String,
    },
    Done,
}

#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressMessage>,
}

pub fn channel() -> (ProgressSender, mpsc::UnboundedReceiver<ProgressMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, rx)
}

impl ProgressSender {
    fn send(&self, message: ProgressMessage) {
        if self.tx.send(message).is_err() {
            debug!(action = "drop", component = "progress", "Aggregator gone, progress message dropped");
        }
    }

    pub fn partial(&self, domain: &Domain, urls_so_far: usize) {
        self.send(ProgressMessage::Partial {
            domain: domain.clone(),
            urls_so_far,
        });
    }

    pub fn complete(&self, domain: &Domain, total_urls: usize, total_param_urls: usize) {
        self.send(ProgressMessage::Complete {
            domain: domain.clone(),
            total_urls,
            total_param_urls,
        });
    }

    pub fn failed(&self, domain: &Domain, reason: impl Into<String>) {
        self.send(ProgressMessage::Failed {
            domain: domain.clone(),
            reason: reason.into(),
        });
    }

    pub fn done(&self) {
        self.send(ProgressMessage::Done);
    }
}

/// Drain `rx` until `Done` (or until every sender is dropped) and return the totals.
pub async fn run_aggregator(
    mut rx: mpsc::UnboundedReceiver<ProgressMessage>,
    domain_count: usize,
) -> RunTotals {
    let mut totals = RunTotals::default();
    // Streamed-but-unfinished counts, for display only.
    let mut in_flight: HashMap<Domain, usize> = HashMap::new();

    while let Some(message) = rx.recv().await {
        match message {
            ProgressMessage::Partial {
                domain,
                urls_so_far,
            } => {
                println!("  • Streamed {} URLs for {}...", format_number(urls_so_far), domain);
                in_flight.insert(domain, urls_so_far);
                debug!(
                    action = "partial",
                    component = "aggregator",
                    in_flight_urls = in_flight.values().sum::<usize>(),
                    in_flight_domains = in_flight.len(),
                    "Progress update"
                );
            }
            ProgressMessage::Complete {
                domain,
                total_urls,
                total_param_urls,
            } => {
                in_flight.remove(&domain);
                totals.total_urls += total_urls;
                totals.param_urls += total_param_urls;
                totals.domains_completed += 1;

                println!(
                    "✓ [{}/{}] {}: {} URLs, {} parameter URLs",
                    totals.domains_completed + totals.failed.len(),
                    domain_count,
                    domain,
                    format_number(total_urls),
                    format_number(total_param_urls)
                );
                info!(
                    action = "complete",
                    component = "aggregator",
                    domain = %domain,
                    total_urls,
                    param_urls = total_param_urls,
                    cumulative_urls = totals.total_urls,
                    cumulative_param_urls = totals.param_urls,
                    "Domain complete"
                );
            }
            ProgressMessage::Failed { domain, reason } => {
                in_flight.remove(&domain);
                println!(
                    "✗ [{}/{}] {}: {}",
                    totals.domains_completed + totals.failed.len() + 1,
                    domain_count,
                    domain,
                    reason
                );
                warn!(action = "failed", component = "aggregator", domain = %domain, reason = %reason, "Domain failed");
                totals.failed.push(DomainFailure { domain, reason });
            }
            ProgressMessage::Done => break,
        }
    }

    totals
}
