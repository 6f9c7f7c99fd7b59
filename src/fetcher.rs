//! Streaming client for the archive index.
//!
//! The response body is never buffered whole: bytes are split into lines as
//! chunks arrive and each non-empty line is handed to the caller.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::{HarvestConfig, DEFAULT_USER_AGENT};
use crate::domain::Domain;
use crate::error::{FetchError, HarvestError};
use crate::progress::ProgressSender;

/// A `Partial` progress message is sent every this many lines.
pub const PARTIAL_INTERVAL: usize = 1000;

pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;
pub type UrlStream = BoxStream<'static, Result<String, FetchError>>;

/// Anything that can stream archived URLs for a domain.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn open(&self, domain: &Domain) -> Result<UrlStream, FetchError>;
}

/// Splits a byte stream into non-empty lines with `\n` / `\r\n` removed.
pub struct LineStream {
    inner: ByteStream,
    buffer: Vec<u8>,
    finished: bool,
}

impl LineStream {
    pub fn new(inner: impl Stream<Item = Result<Bytes, FetchError>> + Send + 'static) -> Self {
        Self {
            inner: inner.boxed(),
            buffer: Vec::new(),
            finished: false,
        }
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    (!raw.is_empty()).then(|| String::from_utf8_lossy(raw).into_owned())
}

fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    loop {
        let newline = buffer.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = buffer.drain(..=newline).collect();
        if let Some(line) = decode_line(&raw[..newline]) {
            return Some(line);
        }
    }
}

impl Stream for LineStream {
    type Item = Result<String, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(line) = take_line(&mut this.buffer) {
                return Poll::Ready(Some(Ok(line)));
            }

            if this.finished {
                // Last line may have no terminating newline.
                let rest = std::mem::take(&mut this.buffer);
                return Poll::Ready(decode_line(&rest).map(Ok));
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => this.finished = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Archive index client speaking the CDX text API.
pub struct WaybackClient {
    client: Client,
    endpoint: String,
}

impl WaybackClient {
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let agent = HeaderValue::from_str(&config.user_agent).unwrap_or_else(|_| {
            warn!(action = "configure", component = "archive_client", user_agent = %config.user_agent, "Invalid User-Agent, using default");
            HeaderValue::from_static(DEFAULT_USER_AGENT)
        });
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, agent);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(HarvestError::Client)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl ArchiveSource for WaybackClient {
    async fn open(&self, domain: &Domain) -> Result<UrlStream, FetchError> {
        let pattern = domain.wildcard_pattern();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", pattern.as_str()),
                ("collapse", "urlkey"),
                ("output", "text"),
                ("fl", "original"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(action = "fetch", component = "archive_client", domain = %domain, status = %status, "Archive index error");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes_stream().map_err(FetchError::from);
        Ok(LineStream::new(body).boxed())
    }
}

/// Collect every archived URL for `domain`, reporting progress as lines arrive.
pub async fn harvest_urls<S: ArchiveSource + ?Sized>(
    source: &S,
    domain: &Domain,
    progress: &ProgressSender,
) -> Result<Vec<String>, FetchError> {
    let start_time = Instant::now();
    info!(action = "start", component = "archive_fetch", domain = %domain, "Streaming archived URLs");

    let mut lines = source.open(domain).await?;
    let mut urls = Vec::new();
    while let Some(line) = lines.try_next().await? {
        if line.is_empty() {
            continue;
        }
        urls.push(line);
        if urls.len() % PARTIAL_INTERVAL == 0 {
            progress.partial(domain, urls.len());
        }
    }

    info!(
        action = "complete",
        component = "archive_fetch",
        domain = %domain,
        url_count = urls.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Archived URLs fetched"
    );
    Ok(urls)
}
