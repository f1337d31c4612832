//! Remote-job feed aggregation.
//!
//! Fetches job postings from several public providers (RSS feeds, an XML job
//! list and a JSON API), normalizes them into one [`model::JobPosting`]
//! schema and exposes the result to a CLI, an HTTP gateway and a JSON
//! snapshot writer.

pub mod aggregate;
pub mod config;
pub mod feed;
pub mod gateway;
pub mod model;
pub mod snapshot;
pub mod sources;
pub mod util;
