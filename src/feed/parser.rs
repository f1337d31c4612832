use quick_xml::encoding::Decoder;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

/// Maximum element nesting accepted from a feed document.
const MAX_XML_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("document has no root element")]
    NoRoot,
}

/// A namespace-qualified element name used to query an [`XmlElement`].
///
/// `namespace` is the resolved namespace URI, not the prefix, so
/// `job_listing:company` and `jl:company` match the same element when both
/// prefixes are bound to the same URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementName<'a> {
    pub namespace: Option<&'a str>,
    pub local: &'a str,
}

impl<'a> ElementName<'a> {
    /// An element outside any namespace, e.g. plain RSS `<title>`.
    pub const fn plain(local: &'a str) -> Self {
        Self {
            namespace: None,
            local,
        }
    }

    pub const fn qualified(namespace: &'a str, local: &'a str) -> Self {
        Self {
            namespace: Some(namespace),
            local,
        }
    }
}

/// An element of a parsed feed document with its namespace resolved.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub local: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated direct text and CDATA content, unescaped.
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn matches(&self, name: ElementName<'_>) -> bool {
        self.local == name.local && self.namespace.as_deref() == name.namespace
    }

    /// First direct child with the given name.
    pub fn child(&self, name: ElementName<'_>) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.matches(name))
    }

    /// All direct children with the given name, in document order.
    pub fn children_named<'s>(
        &'s self,
        name: ElementName<'s>,
    ) -> impl Iterator<Item = &'s XmlElement> + 's {
        self.children.iter().filter(move |c| c.matches(name))
    }

    /// Text of the first matching child, `None` when the child is absent or
    /// holds only whitespace.
    pub fn child_text(&self, name: ElementName<'_>) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.as_str())
            .filter(|t| !t.trim().is_empty())
    }

    /// All matching descendants in document order (depth first), excluding
    /// `self`.
    pub fn descendants(&self, name: ElementName<'_>) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        let mut stack: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(el) = stack.pop() {
            if el.matches(name) {
                found.push(el);
            }
            stack.extend(el.children.iter().rev());
        }
        found
    }

    /// Value of an un-prefixed attribute.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == local)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses a feed document into an element tree with namespaces resolved.
///
/// Text content is unescaped with the HTML5 entity table, so feeds that leak
/// `&nbsp;` into XML still parse. CDATA sections are appended to the owning
/// element's text verbatim.
///
/// # Errors
///
/// Returns [`XmlError`] for syntax errors, unbalanced or unclosed elements,
/// nesting deeper than 64 levels, or a document without a root element.
pub fn parse_document(bytes: &[u8]) -> Result<XmlElement, XmlError> {
    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations from a DOCTYPE;
    // only the predefined and HTML5 named references below are resolved.
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
        let namespace = namespace_of(&ns);
        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_XML_DEPTH {
                    return Err(XmlError::MaxDepthExceeded(MAX_XML_DEPTH));
                }
                stack.push(element_from(namespace, &e, reader.decoder()));
            }
            Event::Empty(e) => {
                let element = element_from(namespace, &e, reader.decoder());
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                // quick-xml has already checked that the end tag matches
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    match e.unescape_with(resolve_html5_entity) {
                        Ok(text) => current.text.push_str(&text),
                        Err(err) => {
                            tracing::debug!(error = %err, "Keeping undecodable XML text as-is");
                            current.text.push_str(&String::from_utf8_lossy(&e));
                        }
                    }
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.local));
    }
    root.ok_or(XmlError::NoRoot)
}

fn namespace_of(ns: &ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(namespace) => {
            Some(String::from_utf8_lossy(namespace.as_ref()).into_owned())
        }
        _ => None,
    }
}

fn element_from(namespace: Option<String>, e: &BytesStart<'_>, decoder: Decoder) -> XmlElement {
    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed XML attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        match attr.decode_and_unescape_value(decoder) {
            Ok(value) => attributes.push((key, value.into_owned())),
            Err(err) => tracing::warn!(attribute = %key, error = %err, "Skipping undecodable XML attribute"),
        }
    }

    XmlElement {
        namespace,
        local: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
        attributes,
        text: String::new(),
        children: Vec::new(),
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "https://aijobs.net";

    const NAMESPACED_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:job_listing="https://aijobs.net">
  <channel>
    <title>Jobs</title>
    <item>
      <title>ML Engineer</title>
      <job_listing:company>Acme</job_listing:company>
      <company>Plain Co</company>
      <description><![CDATA[<p>Build models</p>]]></description>
      <guid isPermaLink="false">abc-123</guid>
    </item>
    <item>
      <title>Data &amp; Analytics</title>
      <job_listing:company/>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_descendants_in_document_order() {
        let root = parse_document(NAMESPACED_RSS.as_bytes()).unwrap();
        assert_eq!(root.local, "rss");
        let items = root.descendants(ElementName::plain("item"));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].child_text(ElementName::plain("title")), Some("ML Engineer"));
        assert_eq!(items[1].child_text(ElementName::plain("title")), Some("Data & Analytics"));
    }

    #[test]
    fn test_namespace_resolution_distinguishes_elements() {
        let root = parse_document(NAMESPACED_RSS.as_bytes()).unwrap();
        let item = root.descendants(ElementName::plain("item"))[0];
        assert_eq!(
            item.child_text(ElementName::qualified(NS, "company")),
            Some("Acme")
        );
        assert_eq!(item.child_text(ElementName::plain("company")), Some("Plain Co"));
        assert_eq!(
            item.child_text(ElementName::qualified("https://other.example", "company")),
            None
        );
    }

    #[test]
    fn test_prefix_is_irrelevant_only_uri_matters() {
        let xml = r#"<rss xmlns:jl="https://aijobs.net"><item><jl:company>Acme</jl:company></item></rss>"#;
        let root = parse_document(xml.as_bytes()).unwrap();
        let item = root.descendants(ElementName::plain("item"))[0];
        assert_eq!(
            item.child_text(ElementName::qualified(NS, "company")),
            Some("Acme")
        );
    }

    #[test]
    fn test_empty_element_has_no_text() {
        let root = parse_document(NAMESPACED_RSS.as_bytes()).unwrap();
        let item = root.descendants(ElementName::plain("item"))[1];
        assert!(item.child(ElementName::qualified(NS, "company")).is_some());
        assert_eq!(item.child_text(ElementName::qualified(NS, "company")), None);
    }

    #[test]
    fn test_cdata_kept_verbatim() {
        let root = parse_document(NAMESPACED_RSS.as_bytes()).unwrap();
        let item = root.descendants(ElementName::plain("item"))[0];
        assert_eq!(
            item.child_text(ElementName::plain("description")),
            Some("<p>Build models</p>")
        );
    }

    #[test]
    fn test_attributes() {
        let xml = r#"<jobs><job id="42"><name>Dev</name></job></jobs>"#;
        let root = parse_document(xml.as_bytes()).unwrap();
        let job = root.descendants(ElementName::plain("job"))[0];
        assert_eq!(job.attr("id"), Some("42"));
        assert_eq!(job.attr("missing"), None);
    }

    #[test]
    fn test_html_entities_in_text() {
        let xml = "<rss><item><title>Senior&nbsp;Dev</title></item></rss>";
        let root = parse_document(xml.as_bytes()).unwrap();
        let item = root.descendants(ElementName::plain("item"))[0];
        assert_eq!(item.child_text(ElementName::plain("title")), Some("Senior\u{a0}Dev"));
    }

    #[test]
    fn test_unclosed_document_rejected() {
        assert!(parse_document(b"<rss><channel><item>").is_err());
    }

    #[test]
    fn test_mismatched_end_tag_rejected() {
        assert!(parse_document(b"<rss><channel></rss>").is_err());
    }

    #[test]
    fn test_text_only_document_rejected() {
        let err = parse_document(b"this is not xml").unwrap_err();
        assert!(matches!(err, XmlError::NoRoot));
    }

    #[test]
    fn test_depth_limit() {
        let xml = "<a>".repeat(MAX_XML_DEPTH + 1);
        let err = parse_document(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, XmlError::MaxDepthExceeded(_)));
    }
}
