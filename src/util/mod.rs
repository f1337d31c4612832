//! Text and date normalization shared by every source adapter.
//!
//! - **Text**: entity decoding, Unicode NFC composition and HTML-to-text
//!   conversion that keeps one line per text node
//! - **Dates**: per-source date formats normalized to `YYYY-MM-DD`, with an
//!   explicit fallback policy for unreadable values
//!
//! # Examples
//!
//! ```
//! use jobfeed::util::{clean, html_to_text, parse_date, DateFallback, DateFormat};
//!
//! assert_eq!(clean(Some("Caf&eacute;")), "Café");
//! assert_eq!(html_to_text(Some("<p>A</p><p>B</p>"), false), "A\nB");
//! assert_eq!(
//!     parse_date(Some("2025-03-11T21:00:08+00:00"), DateFormat::IsoDateTime, DateFallback::Empty),
//!     "2025-03-11"
//! );
//! ```

mod dates;
mod text;

pub use dates::{parse_calendar_date, parse_date, DateFallback, DateFormat};
pub use text::{clean, html_to_text};
