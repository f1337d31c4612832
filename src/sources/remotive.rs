//! [Remotive](https://remotive.com) RSS feed.
//!
//! Uses plain (un-namespaced) `company`, `location`, `type` and `category`
//! elements. Descriptions sometimes carry literal CDATA markers inside the
//! escaped HTML, so they are stripped before the markup is flattened.

use async_trait::async_trait;

use super::{parse_xml, text_or, SourceAdapter, SourceBatch};
use crate::feed::{ElementName, FeedClient, FetchError, XmlElement};
use crate::model::{
    JobPosting, Source, COMPANY_NOT_SPECIFIED, LOCATION_NOT_SPECIFIED, NOT_SPECIFIED,
};
use crate::util::{clean, html_to_text, parse_date, DateFallback, DateFormat};

pub const ENDPOINT: &str = "https://remotive.com/remote-jobs/feed";

const ITEM: ElementName<'static> = ElementName::plain("item");
const TITLE: ElementName<'static> = ElementName::plain("title");
const PUB_DATE: ElementName<'static> = ElementName::plain("pubDate");
const COMPANY: ElementName<'static> = ElementName::plain("company");
const LOCATION: ElementName<'static> = ElementName::plain("location");
const CATEGORY: ElementName<'static> = ElementName::plain("category");
const JOB_TYPE: ElementName<'static> = ElementName::plain("type");
const DESCRIPTION: ElementName<'static> = ElementName::plain("description");
const LINK: ElementName<'static> = ElementName::plain("link");
const GUID: ElementName<'static> = ElementName::plain("guid");

#[derive(Debug, Clone)]
pub struct Remotive {
    endpoint: String,
}

impl Remotive {
    pub fn new() -> Self {
        Self::with_endpoint(ENDPOINT.to_owned())
    }

    pub fn with_endpoint(endpoint: String) -> Self {
        Self { endpoint }
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<JobPosting>, FetchError> {
        let root = parse_xml(bytes)?;
        Ok(root.descendants(ITEM).into_iter().map(to_posting).collect())
    }
}

impl Default for Remotive {
    fn default() -> Self {
        Self::new()
    }
}

fn to_posting(item: &XmlElement) -> JobPosting {
    let mut posting = JobPosting::new(Source::Remotive);
    posting.title = clean(item.child_text(TITLE));
    posting.posted_date =
        parse_date(item.child_text(PUB_DATE), DateFormat::Rfc1123, DateFallback::Empty);
    posting.company = text_or(item.child_text(COMPANY), COMPANY_NOT_SPECIFIED);
    posting.location = text_or(item.child_text(LOCATION), LOCATION_NOT_SPECIFIED);
    posting.categories = item
        .child_text(CATEGORY)
        .map(|c| vec![clean(Some(c))])
        .unwrap_or_default();
    posting.job_type = text_or(item.child_text(JOB_TYPE), NOT_SPECIFIED);
    posting.description = html_to_text(item.child_text(DESCRIPTION), true);
    posting.link = clean(item.child_text(LINK));
    posting.source_id = item.child_text(GUID).map(guid_suffix).unwrap_or_default();
    posting
}

/// Remotive guids end in the numeric job id: `https://remotive.com/...-1234567`.
fn guid_suffix(guid: &str) -> String {
    let guid = guid.trim();
    clean(Some(guid.rsplit('-').next().unwrap_or(guid)))
}

#[async_trait]
impl SourceAdapter for Remotive {
    fn source(&self) -> Source {
        Source::Remotive
    }

    async fn fetch(&self, client: &FeedClient) -> Result<SourceBatch, FetchError> {
        let bytes = client.get_bytes(&self.endpoint).await?;
        let postings = self.parse(&bytes)?;
        tracing::info!(source = %Source::Remotive, count = postings.len(), "Parsed feed");
        Ok(postings.into())
    }
}
