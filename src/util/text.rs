use std::borrow::Cow;

use quick_xml::escape::resolve_html5_entity;
use scraper::Html;
use unicode_normalization::UnicodeNormalization;

/// Longest entity name we try to resolve (`&CounterClockwiseContourIntegral;` is 31).
const MAX_ENTITY_LEN: usize = 32;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Normalizes a raw feed string into display text.
///
/// Decodes HTML character references (the full HTML5 named set plus decimal
/// and hexadecimal numeric references), recomposes the result to Unicode NFC
/// and trims surrounding whitespace.
///
/// Never fails: an unknown or malformed reference such as `&bogus;` or a bare
/// `&` is copied through unchanged.
///
/// # Examples
///
/// ```
/// use jobfeed::util::clean;
///
/// assert_eq!(clean(Some("Caf&eacute;")), "Café");
/// assert_eq!(clean(Some("  R&amp;D  ")), "R&D");
/// assert_eq!(clean(None), "");
/// ```
pub fn clean(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    if text.is_empty() {
        return String::new();
    }

    let decoded = decode_entities(text);
    let composed: String = decoded.nfc().collect();
    composed.trim().to_owned()
}

/// Converts an HTML fragment to plain text, one text node per line.
///
/// Text nodes are trimmed and joined with `\n` so that paragraphs, list items
/// and `<br>` separated lines stay on their own lines; whitespace-only nodes
/// (indentation between tags) are dropped. Sources that wrap the markup in a
/// literal CDATA block can ask for the `<![CDATA[` / `]]>` markers to be
/// removed first. The joined text is finished with [`clean`].
///
/// # Examples
///
/// ```
/// use jobfeed::util::html_to_text;
///
/// assert_eq!(html_to_text(Some("<p>A</p><p>B</p>"), false), "A\nB");
/// assert_eq!(html_to_text(Some("<![CDATA[<b>Hi</b>]]>"), true), "Hi");
/// ```
pub fn html_to_text(markup: Option<&str>, strip_cdata: bool) -> String {
    let Some(markup) = markup.filter(|m| !m.trim().is_empty()) else {
        return String::new();
    };

    let markup = if strip_cdata {
        Cow::Owned(markup.replace(CDATA_OPEN, "").replace(CDATA_CLOSE, ""))
    } else {
        Cow::Borrowed(markup)
    };

    let fragment = Html::parse_fragment(&markup);
    let text = fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    clean(Some(&text))
}

/// Replaces every resolvable character reference in `s`.
///
/// Returns `Cow::Borrowed` when the input has no `&` at all (common case).
fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match resolve_reference(tail) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Resolves the reference at the start of `tail` (which begins with `&`).
///
/// Returns the replacement text and the number of bytes consumed, including
/// the leading `&` and trailing `;`.
fn resolve_reference(tail: &str) -> Option<(Cow<'static, str>, usize)> {
    // Only look for the terminator within the longest possible name.
    let window = &tail.as_bytes()[1..tail.len().min(MAX_ENTITY_LEN + 1)];
    let semi = window.iter().position(|&b| b == b';')? + 1;
    if semi == 1 {
        return None;
    }
    let name = &tail[1..semi];

    let decoded = match name.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            Cow::Owned(char::from_u32(code)?.to_string())
        }
        None => Cow::Borrowed(resolve_html5_entity(name)?),
    };

    Some((decoded, semi + 1))
}
