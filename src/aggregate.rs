//! Runs source adapters and folds their outcome into one result per source.

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::feed::FeedClient;
use crate::model::{JobPosting, Source};
use crate::sources::{SkippedFeed, SourceAdapter};

/// Sources fetched at the same time by [`run_all`].
const MAX_CONCURRENT_SOURCES: usize = 5;

/// Outcome of one source fetch.
///
/// A failed fetch has no postings and carries the failure reason. A fetch
/// that succeeded with zero postings is still `ok`.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregation {
    pub source: Source,
    pub postings: Vec<JobPosting>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Aggregation {
    pub fn ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// Fetches one source. Never fails: errors become [`Aggregation::failure`].
pub async fn run(adapter: &dyn SourceAdapter, client: &FeedClient) -> Aggregation {
    let source = adapter.source();
    match adapter.fetch(client).await {
        Ok(batch) => {
            tracing::info!(
                source = %source,
                count = batch.postings.len(),
                skipped = batch.skipped.len(),
                "Aggregated source"
            );
            Aggregation {
                source,
                postings: batch.postings,
                skipped: batch.skipped,
                failure: None,
            }
        }
        Err(e) => {
            tracing::warn!(source = %source, kind = e.kind(), error = %e, "Source fetch failed");
            Aggregation {
                source,
                postings: Vec::new(),
                skipped: Vec::new(),
                failure: Some(e.to_string()),
            }
        }
    }
}

/// Fetches several sources concurrently.
///
/// Results come back in the order of `adapters`; a failing source does not
/// affect the others.
pub async fn run_all(adapters: &[Box<dyn SourceAdapter>], client: &FeedClient) -> Vec<Aggregation> {
    stream::iter(adapters)
        .map(|adapter| run(adapter.as_ref(), client))
        .buffered(MAX_CONCURRENT_SOURCES)
        .collect()
        .await
}
