//! Per-provider adapters that fetch a feed and map it to [`JobPosting`]s.
//!
//! Each adapter owns its endpoint(s), wire-format parsing, field mapping and
//! placeholder strings. They share the HTTP client and the text/date helpers
//! in [`crate::util`] by composition.
//!
//! # Supported Sources
//!
//! | Source | Module | Format | Unreadable date |
//! |--------|--------|--------|-----------------|
//! | AI Jobs | [`aijobs`] | RSS with `job_listing:` extension elements | empty |
//! | Remotive | [`remotive`] | RSS with plain extension elements | empty |
//! | RemoteOK | [`remoteok`] | JSON array, first element is metadata | empty |
//! | Jobicy | [`jobicy`] | XML `<job>` records | today |
//! | JobsCollider | [`jobscollider`] | 16 category RSS feeds | today |
//!
//! # Failure Isolation
//!
//! `fetch` returns `Err` only for failures of the whole source. A field that
//! is missing from one entry is replaced by the source's placeholder; a
//! failing sub-feed of JobsCollider is recorded in [`SourceBatch::skipped`].

pub mod aijobs;
pub mod jobicy;
pub mod jobscollider;
pub mod remoteok;
pub mod remotive;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Config;
use crate::feed::{parse_document, FeedClient, FetchError, XmlElement};
use crate::model::{JobPosting, Source};
use crate::util::clean;

pub use aijobs::AiJobs;
pub use jobicy::Jobicy;
pub use jobscollider::JobsCollider;
pub use remoteok::RemoteOk;
pub use remotive::Remotive;

/// A sub-feed that was skipped because its fetch or parse failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFeed {
    pub category: String,
    pub url: String,
    pub reason: String,
}

/// Postings from one successful source fetch.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub postings: Vec<JobPosting>,
    /// Sub-feeds that failed without failing the source.
    pub skipped: Vec<SkippedFeed>,
}

impl From<Vec<JobPosting>> for SourceBatch {
    fn from(postings: Vec<JobPosting>) -> Self {
        Self {
            postings,
            skipped: Vec::new(),
        }
    }
}

/// A job feed provider.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The provider this adapter reads; constant for the adapter's lifetime.
    fn source(&self) -> Source;

    /// Fetches the provider's feed(s) and normalizes every entry.
    async fn fetch(&self, client: &FeedClient) -> Result<SourceBatch, FetchError>;
}

/// Builds the adapter for `source`, honoring endpoint overrides in `config`.
pub fn adapter_for(source: Source, config: &Config) -> Box<dyn SourceAdapter> {
    let endpoint = config.endpoint(source).map(str::to_owned);
    match source {
        Source::AiJobs => Box::new(endpoint.map_or_else(AiJobs::new, AiJobs::with_endpoint)),
        Source::Remotive => {
            Box::new(endpoint.map_or_else(Remotive::new, Remotive::with_endpoint))
        }
        Source::RemoteOk => {
            Box::new(endpoint.map_or_else(RemoteOk::new, RemoteOk::with_endpoint))
        }
        Source::Jobicy => Box::new(endpoint.map_or_else(Jobicy::new, Jobicy::with_endpoint)),
        Source::JobsCollider => {
            let adapter = match endpoint {
                Some(base) => JobsCollider::with_base_url(&base),
                None => JobsCollider::new(),
            };
            Box::new(adapter.with_delay(config.subfeed_delay()))
        }
    }
}

/// Builds one adapter per known source, in [`Source::ALL`] order.
pub fn all_adapters(config: &Config) -> Vec<Box<dyn SourceAdapter>> {
    Source::ALL
        .into_iter()
        .map(|source| adapter_for(source, config))
        .collect()
}

/// Parses an XML payload, mapping failures to [`FetchError::Parse`].
pub(crate) fn parse_xml(bytes: &[u8]) -> Result<XmlElement, FetchError> {
    parse_document(bytes).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Cleaned `value`, or `placeholder` when the value is missing or blank.
pub(crate) fn text_or(value: Option<&str>, placeholder: &str) -> String {
    let cleaned = clean(value);
    if cleaned.is_empty() {
        placeholder.to_owned()
    } else {
        cleaned
    }
}
