//! [RemoteOK](https://remoteok.com) JSON API.
//!
//! The endpoint returns a JSON array whose first element is a legal/metadata
//! notice rather than a job. Every following element is one posting.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{text_or, SourceAdapter, SourceBatch};
use crate::feed::{FeedClient, FetchError};
use crate::model::{JobPosting, Source, COMPANY_NOT_SPECIFIED, LOCATION_NOT_SPECIFIED};
use crate::util::{clean, html_to_text, parse_date, DateFallback, DateFormat};

pub const ENDPOINT: &str = "https://remoteok.com/api";

/// RemoteOK lists only full-time roles and has no job type field.
const JOB_TYPE: &str = "Full-Time";

#[derive(Debug, Clone)]
pub struct RemoteOk {
    endpoint: String,
}

impl RemoteOk {
    pub fn new() -> Self {
        Self::with_endpoint(ENDPOINT.to_owned())
    }

    pub fn with_endpoint(endpoint: String) -> Self {
        Self { endpoint }
    }

    /// Parses the API payload.
    ///
    /// # Errors
    ///
    /// [`FetchError::Parse`] when the body is not JSON, is not an array, or
    /// holds only the metadata element.
    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<JobPosting>, FetchError> {
        let root: Value =
            serde_json::from_slice(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

        let Value::Array(entries) = root else {
            return Err(FetchError::Parse("expected a JSON array".to_owned()));
        };
        if entries.len() < 2 {
            return Err(FetchError::Parse(format!(
                "expected metadata plus at least one job, got {} element(s)",
                entries.len()
            )));
        }

        let postings = entries
            .into_iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, entry)| match entry {
                Value::Object(job) => Some(to_posting(&job)),
                _ => {
                    tracing::warn!(source = %Source::RemoteOk, index, "Skipping non-object entry");
                    None
                }
            })
            .collect();

        Ok(postings)
    }
}

impl Default for RemoteOk {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps one job object. A field that is absent, `null` or of an unexpected
/// JSON type is treated as missing.
fn to_posting(job: &Map<String, Value>) -> JobPosting {
    let tags: Vec<String> = job
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(|t| clean(Some(t)))
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut posting = JobPosting::new(Source::RemoteOk);
    posting.title = clean(text(job, "position"));
    posting.posted_date =
        parse_date(text(job, "date"), DateFormat::IsoDateTime, DateFallback::Empty);
    posting.company = text_or(text(job, "company"), COMPANY_NOT_SPECIFIED);
    posting.location = text_or(text(job, "location"), LOCATION_NOT_SPECIFIED);
    posting.categories = tags.clone();
    posting.tags = tags;
    posting.job_type = JOB_TYPE.to_owned();
    posting.description = html_to_text(text(job, "description"), false);
    posting.link = clean(text(job, "url"));
    posting.source_id = job.get("id").map(id_text).unwrap_or_default();
    posting.salary_min = job.get("salary_min").and_then(salary);
    posting.salary_max = job.get("salary_max").and_then(salary);
    posting
}

fn text<'a>(job: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    job.get(key).and_then(Value::as_str)
}

/// The API has served ids both as strings and as numbers.
fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => clean(Some(s)),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// A salary bound of `0` means "not disclosed". Whole-valued floats such as
/// `95000.0` are accepted.
fn salary(value: &Value) -> Option<u64> {
    let amount = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if !(f.is_finite() && f.fract() == 0.0 && f > 0.0 && f <= u64::MAX as f64) {
                return None;
            }
            f as u64
        }
    };
    (amount > 0).then_some(amount)
}

#[async_trait]
impl SourceAdapter for RemoteOk {
    fn source(&self) -> Source {
        Source::RemoteOk
    }

    async fn fetch(&self, client: &FeedClient) -> Result<SourceBatch, FetchError> {
        let bytes = client.get_bytes(&self.endpoint).await?;
        let postings = self.parse(&bytes)?;
        tracing::info!(source = %Source::RemoteOk, count = postings.len(), "Parsed feed");
        Ok(postings.into())
    }
}
