//! The canonical job record and the identifiers of the feeds that produce it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fallback when a source does not name the employer.
pub const COMPANY_NOT_SPECIFIED: &str = "company not specified";
/// Fallback when a source does not give a location.
pub const LOCATION_NOT_SPECIFIED: &str = "location not specified";
/// Fallback for a missing job type.
pub const NOT_SPECIFIED: &str = "not specified";
/// Jobicy's own wording for a missing region.
pub const NOT_AVAILABLE: &str = "not available";

/// One job posting normalized from any source.
///
/// Every text field is populated: absent source values become an empty
/// string or the source's placeholder. `posted_date` is either empty or a
/// `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub title: String,
    pub posted_date: String,
    pub company: String,
    pub location: String,
    pub categories: Vec<String>,
    pub job_type: String,
    pub description: String,
    pub link: String,
    pub source: String,
    pub source_id: String,
    /// Free-form tags (RemoteOK only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<u64>,
}

impl JobPosting {
    /// Creates a posting for `source` with every field at its empty value.
    pub fn new(source: Source) -> Self {
        Self {
            title: String::new(),
            posted_date: String::new(),
            company: String::new(),
            location: String::new(),
            categories: Vec::new(),
            job_type: String::new(),
            description: String::new(),
            link: String::new(),
            source: source.as_str().to_owned(),
            source_id: String::new(),
            tags: Vec::new(),
            salary_min: None,
            salary_max: None,
        }
    }
}

/// The feed providers this crate knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    AiJobs,
    Remotive,
    RemoteOk,
    Jobicy,
    JobsCollider,
}

#[derive(Debug, Error)]
#[error("unknown source: {0}")]
pub struct UnknownSource(pub String);

impl Source {
    pub const ALL: [Source; 5] = [
        Source::AiJobs,
        Source::Remotive,
        Source::RemoteOk,
        Source::Jobicy,
        Source::JobsCollider,
    ];

    /// Stable identifier written into [`JobPosting::source`] and snapshot paths.
    pub fn as_str(self) -> &'static str {
        match self {
            Source::AiJobs => "aijobs",
            Source::Remotive => "remotive",
            Source::RemoteOk => "remoteok",
            Source::Jobicy => "jobicy",
            Source::JobsCollider => "jobscollider",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = UnknownSource;

    /// Accepts the canonical names plus the `<name>jobs` route aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let name = match name.as_str() {
            "remotivejobs" => "remotive",
            "remoteokjobs" => "remoteok",
            "jobicyjobs" => "jobicy",
            "jobscolliderjobs" => "jobscollider",
            other => other,
        };
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == name)
            .ok_or_else(|| UnknownSource(s.to_owned()))
    }
}
