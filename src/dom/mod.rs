//! Host document tree.
//!
//! HTML is parsed with html5ever into an [`ArenaDom`]; truncation then
//! mutates that tree in place and [`serialize`] writes it back out.
//!
//! # Example
//!
//! ```
//! use readmore::dom::{parse_document, serialize, SelectorSet};
//!
//! let dom = parse_document("<div class='article'><p>Hello.</p></div>");
//! let roots = SelectorSet::parse(".article").unwrap().select(&dom, dom.document());
//! assert_eq!(roots.len(), 1);
//! assert_eq!(serialize(&dom, roots[0]), "<div class=\"article\"><p>Hello.</p></div>");
//! ```

mod arena;
mod element_ref;
mod serialize;
mod tree_sink;

use std::borrow::Cow;

pub use arena::{
    Ancestors, ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute, ChildrenIter,
    Descendants,
};
pub use element_ref::{DomSelectors, ElementRef, SelectorSet};
pub use serialize::{escape_attr, escape_text, serialize, serialize_children};

use html5ever::driver::ParseOpts;
use html5ever::parse_document as html5ever_parse;
use html5ever::tendril::TendrilSink;

use tree_sink::ArenaSink;

/// How far into a byte stream to look for a charset declaration.
const SNIFF_LIMIT: usize = 1024;

/// Parse an HTML document.
pub fn parse_document(html: &str) -> ArenaDom {
    html5ever_parse(ArenaSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse HTML bytes, detecting the encoding.
///
/// UTF-8 is tried first; otherwise the charset named by an XML declaration
/// or `<meta charset>` is used, falling back to Windows-1252.
pub fn parse_document_bytes(html: &[u8]) -> ArenaDom {
    let hint = sniff_encoding(html);
    parse_document(&decode_text(html, hint))
}

/// Parse an HTML fragment.
///
/// Returns the DOM and the top-level nodes of the fragment (the children of
/// the synthesized `<body>`), in order.
pub fn parse_fragment(html: &str) -> (ArenaDom, Vec<ArenaNodeId>) {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    let dom = parse_document(&wrapped);
    let nodes = dom
        .find_by_tag("body")
        .map(|body| dom.children(body).collect())
        .unwrap_or_default();
    (dom, nodes)
}

fn decode_text<'a>(bytes: &'a [u8], hint: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(name) = hint
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        log::debug!("decoding input as {}", encoding.name());
        return encoding.decode(bytes).0;
    }

    log::debug!("input is not UTF-8 and declares no charset; using windows-1252");
    encoding_rs::WINDOWS_1252.decode(bytes).0
}

/// Find the charset named by `<?xml ... encoding="..."?>` or
/// `<meta charset="...">` near the start of the input. Values that are
/// unterminated or not a known encoding label are passed over.
fn sniff_encoding(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(SNIFF_LIMIT)];

    for key in [&b"encoding="[..], &b"charset="[..]] {
        let Some(pos) = prefix
            .windows(key.len())
            .position(|w| w.eq_ignore_ascii_case(key))
        else {
            continue;
        };
        let rest = &prefix[pos + key.len()..];
        let value = match rest.first() {
            Some(&q @ (b'"' | b'\'')) => {
                let Some(end) = rest[1..].iter().position(|&b| b == q) else {
                    continue;
                };
                &rest[1..=end]
            }
            Some(_) => {
                let end = rest
                    .iter()
                    .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b' ' | b'/'))
                    .unwrap_or(rest.len());
                &rest[..end]
            }
            None => continue,
        };
        if let Ok(name) = std::str::from_utf8(value)
            && encoding_rs::Encoding::for_label(name.as_bytes()).is_some()
        {
            return Some(name);
        }
    }
    None
}
