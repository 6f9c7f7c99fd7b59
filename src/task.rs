use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::domain::Domain;
use crate::error::HarvestError;
use crate::fetcher::{harvest_urls, ArchiveSource};
use crate::filter::ParamFilter;
use crate::progress::ProgressSender;
use crate::sink::Sinks;
use crate::stats::DomainReport;

/// Shared collaborators for every domain task in a run.
pub struct Pipeline<S: ?Sized> {
    pub source: Arc<S>,
    pub filter: Arc<ParamFilter>,
    pub sinks: Arc<Sinks>,
}

impl<S: ?Sized> Clone for Pipeline<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            filter: Arc::clone(&self.filter),
            sinks: Arc::clone(&self.sinks),
        }
    }
}

/// Fetch, filter and persist one domain, then report it complete.
///
/// `Complete` is sent only after both appends have finished. Any error ends
/// the domain without a `Complete` message.
pub async fn process_domain<S: ArchiveSource + ?Sized>(
    pipeline: &Pipeline<S>,
    domain: &Domain,
    progress: &ProgressSender,
) -> Result<DomainReport, HarvestError> {
    let start_time = Instant::now();

    let urls = harvest_urls(pipeline.source.as_ref(), domain, progress)
        .await
        .map_err(|source| HarvestError::Fetch {
            domain: domain.to_string(),
            source,
        })?;

    let filter = Arc::clone(&pipeline.filter);
    let (urls, params) = tokio::task::spawn_blocking(move || {
        let params = filter.filter(&urls);
        (urls, params)
    })
    .await?;

    tokio::try_join!(
        pipeline.sinks.all.append_block(&urls),
        pipeline.sinks.params.append_block(&params)
    )?;

    progress.complete(domain, urls.len(), params.len());

    info!(
        action = "complete",
        component = "domain_task",
        domain = %domain,
        total_urls = urls.len(),
        param_urls = params.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Domain processed"
    );

    Ok(DomainReport {
        domain: domain.clone(),
        total_urls: urls.len(),
        param_urls: params.len(),
    })
}
