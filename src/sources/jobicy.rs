//! [Jobicy](https://jobicy.com) XML job feed.
//!
//! Not RSS: the document is a flat list of `<job id="...">` records with
//! child elements named after the fields. Dates are `DD.MM.YYYY`; an
//! unreadable date is stamped with today's date.

use async_trait::async_trait;

use super::{parse_xml, text_or, SourceAdapter, SourceBatch};
use crate::feed::{ElementName, FeedClient, FetchError, XmlElement};
use crate::model::{JobPosting, Source, COMPANY_NOT_SPECIFIED, NOT_AVAILABLE, NOT_SPECIFIED};
use crate::util::{clean, html_to_text, parse_date, DateFallback, DateFormat};

pub const ENDPOINT: &str = "https://jobicy.com/feed/newjobs";

const JOB: ElementName<'static> = ElementName::plain("job");
const NAME: ElementName<'static> = ElementName::plain("name");
const PUB_DATE: ElementName<'static> = ElementName::plain("pubdate");
const COMPANY: ElementName<'static> = ElementName::plain("company");
const REGION: ElementName<'static> = ElementName::plain("region");
const JOB_TYPE: ElementName<'static> = ElementName::plain("jobtype");
const DESCRIPTION: ElementName<'static> = ElementName::plain("description");
const LINK: ElementName<'static> = ElementName::plain("link");

#[derive(Debug, Clone)]
pub struct Jobicy {
    endpoint: String,
}

impl Jobicy {
    pub fn new() -> Self {
        Self::with_endpoint(ENDPOINT.to_owned())
    }

    pub fn with_endpoint(endpoint: String) -> Self {
        Self { endpoint }
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<JobPosting>, FetchError> {
        let root = parse_xml(bytes)?;
        Ok(root.descendants(JOB).into_iter().map(to_posting).collect())
    }
}

impl Default for Jobicy {
    fn default() -> Self {
        Self::new()
    }
}

fn to_posting(job: &XmlElement) -> JobPosting {
    let mut posting = JobPosting::new(Source::Jobicy);
    posting.title = clean(job.child_text(NAME));
    posting.posted_date =
        parse_date(job.child_text(PUB_DATE), DateFormat::DottedDay, DateFallback::Today);
    posting.company = text_or(job.child_text(COMPANY), COMPANY_NOT_SPECIFIED);
    posting.location = text_or(job.child_text(REGION), NOT_AVAILABLE);
    posting.job_type = text_or(job.child_text(JOB_TYPE), NOT_SPECIFIED);
    posting.description = html_to_text(job.child_text(DESCRIPTION), false);
    posting.link = clean(job.child_text(LINK));
    posting.source_id = clean(job.attr("id"));
    posting
}

#[async_trait]
impl SourceAdapter for Jobicy {
    fn source(&self) -> Source {
        Source::Jobicy
    }

    async fn fetch(&self, client: &FeedClient) -> Result<SourceBatch, FetchError> {
        let bytes = client.get_bytes(&self.endpoint).await?;
        let postings = self.parse(&bytes)?;
        tracing::info!(source = %Source::Jobicy, count = postings.len(), "Parsed feed");
        Ok(postings.into())
    }
}
