//! [JobsCollider](https://jobscollider.com) category RSS feeds.
//!
//! JobsCollider publishes one RSS feed per job category. The adapter walks
//! them one at a time, in declaration order, pausing for a random interval
//! between requests. A failing category is skipped and reported; the source
//! as a whole fails only when no category could be read.
//!
//! Titles have the form `"<role> at <company>"`, which is the only place the
//! employer appears.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use url::Url;

use super::{parse_xml, text_or, SkippedFeed, SourceAdapter, SourceBatch};
use crate::feed::{ElementName, FeedClient, FetchError, XmlElement};
use crate::model::{
    JobPosting, Source, COMPANY_NOT_SPECIFIED, LOCATION_NOT_SPECIFIED, NOT_SPECIFIED,
};
use crate::util::{clean, html_to_text, parse_date, DateFallback, DateFormat};

pub const BASE_URL: &str = "https://jobscollider.com/";

/// Category name and feed path relative to [`BASE_URL`], in fetch order.
pub const CATEGORY_FEEDS: [(&str, &str); 16] = [
    ("software_development", "remote-software-development-jobs.rss"),
    ("cybersecurity", "remote-cybersecurity-jobs.rss"),
    ("customer_service", "remote-customer-service-jobs.rss"),
    ("design", "remote-design-jobs.rss"),
    ("marketing", "remote-marketing-jobs.rss"),
    ("sales", "remote-sales-jobs.rss"),
    ("product", "remote-product-jobs.rss"),
    ("business", "remote-business-jobs.rss"),
    ("data", "remote-data-jobs.rss"),
    ("devops", "remote-devops-jobs.rss"),
    ("finance_legal", "remote-finance-legal-jobs.rss"),
    ("human_resources", "remote-human-resources-jobs.rss"),
    ("qa", "remote-qa-jobs.rss"),
    ("writing", "remote-writing-jobs.rss"),
    ("project_management", "remote-project-management-jobs.rss"),
    ("all_others", "remote-all-others-jobs.rss"),
];

/// Default pause between two sub-feed requests.
pub const DEFAULT_DELAY: RangeInclusive<Duration> =
    Duration::from_millis(100)..=Duration::from_millis(500);

/// Separator between role and employer in feed titles.
const COMPANY_SEPARATOR: &str = " at ";

const ITEM: ElementName<'static> = ElementName::plain("item");
const TITLE: ElementName<'static> = ElementName::plain("title");
const DESCRIPTION: ElementName<'static> = ElementName::plain("description");
const PUB_DATE: ElementName<'static> = ElementName::plain("pubDate");
const LINK: ElementName<'static> = ElementName::plain("link");
const GUID: ElementName<'static> = ElementName::plain("guid");

#[derive(Debug, Clone)]
pub struct JobsCollider {
    /// `(category, absolute feed URL)` pairs.
    feeds: Vec<(String, String)>,
    delay: RangeInclusive<Duration>,
}

impl JobsCollider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Resolves every category path against `base` instead of the public site.
    pub fn with_base_url(base: &str) -> Self {
        let feeds = CATEGORY_FEEDS
            .iter()
            .map(|(category, path)| ((*category).to_owned(), join_url(base, path)))
            .collect();
        Self {
            feeds,
            delay: DEFAULT_DELAY,
        }
    }

    /// Replaces the category list, e.g. to read a subset of feeds.
    pub fn with_feeds(mut self, feeds: Vec<(String, String)>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn with_delay(mut self, delay: RangeInclusive<Duration>) -> Self {
        self.delay = delay;
        self
    }

    pub fn feeds(&self) -> &[(String, String)] {
        &self.feeds
    }

    /// Parses one category feed; every posting is tagged with `category`.
    pub fn parse(&self, category: &str, bytes: &[u8]) -> Result<Vec<JobPosting>, FetchError> {
        let root = parse_xml(bytes)?;
        Ok(root
            .descendants(ITEM)
            .into_iter()
            .map(|item| to_posting(item, category))
            .collect())
    }

    fn pick_delay(&self) -> Duration {
        let min = self.delay.start().as_millis() as u64;
        let max = self.delay.end().as_millis() as u64;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    async fn fetch_feed(
        &self,
        client: &FeedClient,
        category: &str,
        url: &str,
    ) -> Result<Vec<JobPosting>, FetchError> {
        let bytes = client.get_bytes(url).await?;
        self.parse(category, &bytes)
    }
}

impl Default for JobsCollider {
    fn default() -> Self {
        Self::new()
    }
}

fn join_url(base: &str, path: &str) -> String {
    // A base without a trailing slash would have its last segment replaced.
    let base = format!("{}/", base.trim_end_matches('/'));
    match Url::parse(&base).and_then(|b| b.join(path)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::warn!(base = %base, error = %e, "Invalid JobsCollider base URL");
            format!("{base}{path}")
        }
    }
}

fn to_posting(item: &XmlElement, category: &str) -> JobPosting {
    let title = clean(item.child_text(TITLE));
    let company = title
        .split_once(COMPANY_SEPARATOR)
        .map(|(_, company)| company);

    let mut posting = JobPosting::new(Source::JobsCollider);
    posting.company = text_or(company, COMPANY_NOT_SPECIFIED);
    posting.title = title;
    posting.posted_date =
        parse_date(item.child_text(PUB_DATE), DateFormat::Rfc1123, DateFallback::Today);
    posting.location = LOCATION_NOT_SPECIFIED.to_owned();
    posting.categories = vec![category.to_owned()];
    posting.job_type = NOT_SPECIFIED.to_owned();
    posting.description = html_to_text(item.child_text(DESCRIPTION), false);
    posting.link = clean(item.child_text(LINK));
    posting.source_id = clean(item.child_text(GUID));
    posting
}

#[async_trait]
impl SourceAdapter for JobsCollider {
    fn source(&self) -> Source {
        Source::JobsCollider
    }

    async fn fetch(&self, client: &FeedClient) -> Result<SourceBatch, FetchError> {
        let mut batch = SourceBatch::default();
        let mut succeeded = 0usize;
        let mut last_error: Option<FetchError> = None;

        for (index, (category, url)) in self.feeds.iter().enumerate() {
            if index > 0 {
                let pause = self.pick_delay();
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }

            match self.fetch_feed(client, category, url).await {
                Ok(postings) => {
                    tracing::debug!(
                        source = %Source::JobsCollider,
                        category = %category,
                        count = postings.len(),
                        "Parsed sub-feed"
                    );
                    succeeded += 1;
                    batch.postings.extend(postings);
                }
                Err(e) => {
                    tracing::warn!(
                        source = %Source::JobsCollider,
                        category = %category,
                        url = %url,
                        kind = e.kind(),
                        error = %e,
                        "Skipping sub-feed"
                    );
                    batch.skipped.push(SkippedFeed {
                        category: category.clone(),
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(last) = last_error {
                return Err(FetchError::AllSubFeedsFailed {
                    attempted: self.feeds.len(),
                    last: last.to_string(),
                });
            }
        }

        tracing::info!(
            source = %Source::JobsCollider,
            count = batch.postings.len(),
            skipped = batch.skipped.len(),
            "Parsed feed"
        );
        Ok(batch)
    }
}
