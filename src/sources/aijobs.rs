//! [AI Jobs](https://aijobs.net) RSS feed.
//!
//! Employer, location and job type live in extension elements of the
//! `https://aijobs.net` namespace (conventionally prefixed `job_listing:`).

use async_trait::async_trait;

use super::{parse_xml, text_or, SourceAdapter, SourceBatch};
use crate::feed::{ElementName, FeedClient, FetchError};
use crate::model::{
    JobPosting, Source, COMPANY_NOT_SPECIFIED, LOCATION_NOT_SPECIFIED, NOT_SPECIFIED,
};
use crate::util::{clean, html_to_text, parse_date, DateFallback, DateFormat};

pub const ENDPOINT: &str = "https://aijobs.net/feed";
pub const NAMESPACE: &str = "https://aijobs.net";

const ITEM: ElementName<'static> = ElementName::plain("item");
const TITLE: ElementName<'static> = ElementName::plain("title");
const DESCRIPTION: ElementName<'static> = ElementName::plain("description");
const PUB_DATE: ElementName<'static> = ElementName::plain("pubDate");
const LINK: ElementName<'static> = ElementName::plain("link");
const GUID: ElementName<'static> = ElementName::plain("guid");
const CATEGORY: ElementName<'static> = ElementName::plain("category");

#[derive(Debug, Clone)]
pub struct AiJobs {
    endpoint: String,
    namespace: String,
}

impl AiJobs {
    pub fn new() -> Self {
        Self::with_endpoint(ENDPOINT.to_owned())
    }

    pub fn with_endpoint(endpoint: String) -> Self {
        Self {
            endpoint,
            namespace: NAMESPACE.to_owned(),
        }
    }

    /// Reads the extension elements from a different namespace URI.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_owned();
        self
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<JobPosting>, FetchError> {
        let root = parse_xml(bytes)?;
        let ns = self.namespace.as_str();

        let postings = root
            .descendants(ITEM)
            .into_iter()
            .map(|item| {
                let mut posting = JobPosting::new(Source::AiJobs);
                posting.title = clean(item.child_text(TITLE));
                posting.posted_date =
                    parse_date(item.child_text(PUB_DATE), DateFormat::Rfc1123, DateFallback::Empty);
                posting.company = text_or(
                    item.child_text(ElementName::qualified(ns, "company")),
                    COMPANY_NOT_SPECIFIED,
                );
                posting.location = text_or(
                    item.child_text(ElementName::qualified(ns, "location")),
                    LOCATION_NOT_SPECIFIED,
                );
                posting.job_type = text_or(
                    item.child_text(ElementName::qualified(ns, "job_type")),
                    NOT_SPECIFIED,
                );
                posting.categories = item
                    .children_named(CATEGORY)
                    .map(|c| clean(Some(&c.text)))
                    .filter(|c| !c.is_empty())
                    .collect();
                posting.description = html_to_text(item.child_text(DESCRIPTION), false);
                posting.link = clean(item.child_text(LINK));
                posting.source_id = clean(item.child_text(GUID));
                posting
            })
            .collect();

        Ok(postings)
    }
}

impl Default for AiJobs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for AiJobs {
    fn source(&self) -> Source {
        Source::AiJobs
    }

    async fn fetch(&self, client: &FeedClient) -> Result<SourceBatch, FetchError> {
        let bytes = client.get_bytes(&self.endpoint).await?;
        let postings = self.parse(&bytes)?;
        tracing::info!(source = %Source::AiJobs, count = postings.len(), "Parsed feed");
        Ok(postings.into())
    }
}
