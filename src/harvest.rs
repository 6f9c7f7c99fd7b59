use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::config::HarvestConfig;
use crate::domain::Domain;
use crate::error::HarvestError;
use crate::fetcher::ArchiveSource;
use crate::filter::ParamFilter;
use crate::progress::{self, run_aggregator, ProgressSender};
use crate::sink::Sinks;
use crate::stats::{DomainReport, HarvestSummary};
use crate::task::{process_domain, Pipeline};
use crate::utils::format_number;

/// Wait for a slot on `permits`, then process `domain` while holding it.
async fn run_with_permit<S: ArchiveSource + ?Sized>(
    permits: Arc<Semaphore>,
    pipeline: &Pipeline<S>,
    domain: &Domain,
    progress: &ProgressSender,
) -> Result<DomainReport, HarvestError> {
    let _permit = permits.acquire_owned().await?;
    process_domain(pipeline, domain, progress).await
}

/// Harvest every domain concurrently and return the run totals.
///
/// A failing domain is recorded and the run carries on. Only setup
/// problems (sinks, filter pool) end the run early.
pub async fn run_harvest<S: ArchiveSource + 'static>(
    source: Arc<S>,
    domains: Vec<Domain>,
    config: &HarvestConfig,
) -> Result<HarvestSummary, HarvestError> {
    let total_start_time = Instant::now();
    info!(
        action = "start",
        component = "harvest",
        domain_count = domains.len(),
        concurrency = config.concurrency,
        filter_workers = config.filter_workers,
        "Starting harvest"
    );

    let sinks = Sinks::reset(&config.all_urls_path, &config.param_urls_path).await?;
    let filter = ParamFilter::new(config.filter_workers, config.match_mode)?;
    let pipeline = Pipeline {
        source,
        filter: Arc::new(filter),
        sinks: Arc::new(sinks),
    };

    let (progress, rx) = progress::channel();
    let aggregator = tokio::spawn(run_aggregator(rx, domains.len()));
    let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));

    let mut handles = Vec::with_capacity(domains.len());
    for domain in &domains {
        let pipeline = pipeline.clone();
        let progress = progress.clone();
        let permits = Arc::clone(&permits);
        let task_domain = domain.clone();

        let handle = tokio::spawn(async move {
            run_with_permit(permits, &pipeline, &task_domain, &progress).await
        });
        handles.push((domain.clone(), handle));
    }

    // Each outcome is taken on its own so one failure never stops the rest.
    for (domain, handle) in handles {
        let reason = match handle.await {
            Ok(Ok(_)) => continue,
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("domain task aborted: {e}"),
        };
        error!(action = "failed", component = "harvest", domain = %domain, reason = %reason, "Domain task failed");
        progress.failed(&domain, reason);
    }

    progress.done();
    drop(progress);
    let totals = aggregator.await.map_err(HarvestError::Aggregator)?;

    let elapsed = total_start_time.elapsed();
    info!(
        action = "complete",
        component = "harvest",
        domains_completed = totals.domains_completed,
        domains_failed = totals.failed.len(),
        total_urls = totals.total_urls,
        param_urls = totals.param_urls,
        duration_ms = elapsed.as_millis(),
        "Harvest completed"
    );

    Ok(HarvestSummary {
        domains: domains.len(),
        totals,
        elapsed,
        all_urls_path: config.all_urls_path.clone(),
        param_urls_path: config.param_urls_path.clone(),
    })
}

pub fn print_summary(summary: &HarvestSummary) {
    let totals = &summary.totals;

    println!("\n--- Harvest Summary ---");
    println!(
        "Domains: {} total, {} completed, {} failed",
        format_number(summary.domains),
        format_number(totals.domains_completed),
        format_number(totals.failed.len())
    );
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!(
        "  • {} ({} URLs)",
        summary.all_urls_path.display(),
        format_number(totals.total_urls)
    );
    println!(
        "  • {} ({} parameter URLs)",
        summary.param_urls_path.display(),
        format_number(totals.param_urls)
    );

    if !totals.failed.is_empty() {
        println!("\nFailed domains:");
        for failure in &totals.failed {
            println!("- {}: {}", failure.domain, failure.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetcher::UrlStream;
    use crate::normalize::MatchMode;
    use crate::progress::ProgressMessage;
    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};

    struct OneUrl;

    #[async_trait]
    impl ArchiveSource for OneUrl {
        async fn open(&self, domain: &Domain) -> Result<UrlStream, FetchError> {
            Ok(stream::iter(vec![Ok(format!("http://{domain}/?q=1"))]).boxed())
        }
    }

    async fn pipeline(dir: &std::path::Path) -> Pipeline<OneUrl> {
        Pipeline {
            source: Arc::new(OneUrl),
            filter: Arc::new(ParamFilter::new(1, MatchMode::Loose).unwrap()),
            sinks: Arc::new(
                Sinks::reset(&dir.join("all.txt"), &dir.join("params.txt"))
                    .await
                    .unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn permitted_domain_is_processed() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;
        let domain = Domain::parse("a.com").unwrap();
        let (sender, mut rx) = progress::channel();

        let report = run_with_permit(Arc::new(Semaphore::new(1)), &pipeline, &domain, &sender)
            .await
            .unwrap();
        assert_eq!(report.total_urls, 1);
        assert_eq!(report.param_urls, 1);
        assert!(matches!(rx.recv().await, Some(ProgressMessage::Complete { .. })));
    }

    #[tokio::test]
    async fn closed_scheduler_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path()).await;
        let domain = Domain::parse("a.com").unwrap();
        let (sender, mut rx) = progress::channel();

        let permits = Arc::new(Semaphore::new(1));
        permits.close();

        let result = run_with_permit(permits, &pipeline, &domain, &sender).await;
        assert!(matches!(result, Err(HarvestError::Scheduler(_))));

        drop(sender);
        assert!(rx.recv().await.is_none());
    }
}
