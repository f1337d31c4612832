//! Transport and wire-format layer shared by the source adapters.
//!
//! - **Fetching**: one HTTP client with a browser `User-Agent`, a per-request
//!   deadline and a response size cap
//! - **Parsing**: a namespace-resolving XML reader that turns RSS and other
//!   XML feeds into a small element tree queried by `(namespace, name)`
//!
//! # Architecture
//!
//! - [`fetcher`] - HTTP retrieval and the [`FetchError`] taxonomy
//! - [`parser`] - XML document tree built with `quick-xml`
//!
//! # Example
//!
//! ```ignore
//! use crate::feed::{parse_document, ElementName, FeedClient};
//!
//! let bytes = client.get_bytes("https://remotive.com/remote-jobs/feed").await?;
//! let root = parse_document(&bytes)?;
//! for item in root.descendants(ElementName::plain("item")) {
//!     println!("{:?}", item.child_text(ElementName::plain("title")));
//! }
//! ```

mod fetcher;
mod parser;

pub use fetcher::{FeedClient, FetchError, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use parser::{parse_document, ElementName, XmlElement, XmlError};
