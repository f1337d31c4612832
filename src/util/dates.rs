use chrono::{DateTime, Local, NaiveDate};

/// Canonical output layout for every normalized date.
const CANONICAL: &str = "%Y-%m-%d";

/// Native date encodings used by the supported feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `Wed, 12 Mar 2025 20:51:28 +0000`, also with a zone name such as `GMT`.
    Rfc1123,
    /// `12.03.2025`
    DottedDay,
    /// `2025-03-11T21:00:08+00:00` (offset with or without colon).
    IsoDateTime,
    /// `2025-03-11`, already canonical.
    IsoDate,
}

/// What a source reports when its date cannot be read.
///
/// Sources treat the field differently: some consider it advisory and stamp
/// today's date, others report the date as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFallback {
    /// Unparseable dates become the empty string.
    Empty,
    /// Unparseable dates become the current local date.
    Today,
}

impl DateFallback {
    fn resolve(self) -> String {
        match self {
            DateFallback::Empty => String::new(),
            DateFallback::Today => Local::now().date_naive().format(CANONICAL).to_string(),
        }
    }
}

/// Normalizes a source date string to `YYYY-MM-DD`.
///
/// Timestamps keep the calendar date of their own offset, so
/// `Tue, 11 Mar 2025 23:30:00 -0500` yields `2025-03-11`.
///
/// # Examples
///
/// ```
/// use jobfeed::util::{parse_date, DateFallback, DateFormat};
///
/// assert_eq!(parse_date(Some("12.03.2025"), DateFormat::DottedDay, DateFallback::Empty), "2025-03-12");
/// assert_eq!(parse_date(Some("garbage"), DateFormat::DottedDay, DateFallback::Empty), "");
/// ```
pub fn parse_date(raw: Option<&str>, format: DateFormat, fallback: DateFallback) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| parse_calendar_date(s, format))
        .map(|date| date.format(CANONICAL).to_string())
        .unwrap_or_else(|| fallback.resolve())
}

/// Parses `raw` in the given format, returning only the calendar date.
pub fn parse_calendar_date(raw: &str, format: DateFormat) -> Option<NaiveDate> {
    match format {
        DateFormat::Rfc1123 => DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|dt| dt.date_naive()),
        DateFormat::DottedDay => NaiveDate::parse_from_str(raw, "%d.%m.%Y").ok(),
        DateFormat::IsoDateTime => DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.date_naive()),
        DateFormat::IsoDate => NaiveDate::parse_from_str(raw, CANONICAL).ok(),
    }
}
