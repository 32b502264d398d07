//! Remote ordered store interface and backends.
//!
//! The store is an external collaborator: this crate only queries it, by
//! creation time descending, in bounded batches. `HttpGreetingStore` talks to
//! a PostgREST-style endpoint; `MemoryStore` is an in-process implementation
//! used in unit tests and as a safe default for backends that have no remote
//! collection to talk to.

use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;

use crate::{Error, GreetingRecord, Result};

/// One bounded batch request against the ordered collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
    /// Ask the store to report the collection's total count when it can
    pub want_total: bool,
}

/// One bounded batch of rows, newest first, plus the optional total
#[derive(Debug, Clone, Default)]
pub struct PageResponse {
    pub rows: Vec<GreetingRecord>,
    pub total: Option<u64>,
}

/// Core trait for remote store implementations
pub trait GreetingStore: Send + Sync {
    /// Fetch one batch, ordered by creation time descending.
    ///
    /// Any transport or query failure surfaces as a single opaque
    /// `Error::Retrieval`.
    fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<PageResponse>>;
}

/// In-process store over a fixed row set.
///
/// Rows are held newest-first, matching the remote ordering contract.
/// `report_total` switches between count-reporting and count-less stores;
/// `set_fail` injects a retrieval failure for error-path tests.
pub struct MemoryStore {
    rows: Vec<GreetingRecord>,
    report_total: bool,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new(rows: Vec<GreetingRecord>) -> Self {
        Self { rows, report_total: true, fail: AtomicBool::new(false) }
    }

    /// A store that never reports a total count (exercises the batch-size
    /// `has_more` fallback).
    pub fn without_total(rows: Vec<GreetingRecord>) -> Self {
        Self { rows, report_total: false, fail: AtomicBool::new(false) }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl GreetingStore for MemoryStore {
    fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<PageResponse>> {
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Retrieval("injected store failure".to_string()));
            }
            let start = req.offset.min(self.rows.len());
            let end = (req.offset + req.limit).min(self.rows.len());
            let rows = self.rows[start..end].to_vec();
            let total = if self.report_total && req.want_total {
                Some(self.rows.len() as u64)
            } else {
                None
            };
            Ok(PageResponse { rows, total })
        })
    }
}

/// PostgREST-style HTTP store adapter.
///
/// Queries `<endpoint>?order=created_at.desc&offset=N&limit=M` and, when a
/// total is requested, sends `Prefer: count=exact` and reads the count back
/// from the `Content-Range` response header (`0-7/42`).
#[cfg(feature = "http-store")]
pub struct HttpGreetingStore {
    client: reqwest::Client,
    endpoint: url::Url,
}

#[cfg(feature = "http-store")]
impl HttpGreetingStore {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, 30_000)
    }

    pub fn with_timeout(endpoint: &str, timeout_ms: u64) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid store endpoint: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, endpoint })
    }
}

#[cfg(feature = "http-store")]
impl GreetingStore for HttpGreetingStore {
    fn fetch_page(&self, req: PageRequest) -> BoxFuture<'_, Result<PageResponse>> {
        Box::pin(async move {
            let mut url = self.endpoint.clone();
            url.query_pairs_mut()
                .append_pair("order", "created_at.desc")
                .append_pair("offset", &req.offset.to_string())
                .append_pair("limit", &req.limit.to_string());

            let mut request = self.client.get(url);
            if req.want_total {
                request = request.header("Prefer", "count=exact");
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(Error::Retrieval(format!(
                    "store returned HTTP {}",
                    response.status()
                )));
            }

            let total = response
                .headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range_total);

            let rows: Vec<GreetingRecord> = response
                .json()
                .await
                .map_err(|e| Error::Retrieval(format!("malformed store rows: {}", e)))?;

            log::debug!("fetched {} rows (total: {:?})", rows.len(), total);
            Ok(PageResponse { rows, total })
        })
    }
}

/// Parse the total out of a `Content-Range` header value like `0-7/42`.
/// A `*` total (count unknown) yields `None`.
#[cfg(feature = "http-store")]
fn parse_content_range_total(value: &str) -> Option<u64> {
    let total = value.rsplit('/').next()?;
    total.trim().parse::<u64>().ok()
}
