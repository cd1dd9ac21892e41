//! HTML serializer for [`ArenaDom`].
//!
//! Writes the tree back out verbatim (no reindentation) so truncated output
//! diffs cleanly against its input. The visibility state is rendered as an
//! inline `display: none` declaration appended to the element's own style.

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are written unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

const HIDDEN_DECLARATION: &str = "display: none";

/// Serialize a node and its subtree.
pub fn serialize(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

/// Serialize only the children of a node (its "inner HTML").
pub fn serialize_children(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let raw = is_raw_text_parent(dom, id);
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, child, raw, &mut out);
    }
    out
}

fn is_raw_text_parent(dom: &ArenaDom, id: ArenaNodeId) -> bool {
    dom.element_name(id)
        .is_some_and(|n| RAW_TEXT_ELEMENTS.contains(&n.as_ref()))
}

fn write_node(dom: &ArenaDom, id: ArenaNodeId, raw_text: bool, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        ArenaNodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, false, out);
            }
        }
        ArenaNodeData::Doctype { name, .. } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        ArenaNodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        ArenaNodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        ArenaNodeData::Element { name, attrs, .. } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);

            let mut wrote_style = false;
            for attr in attrs {
                let mut value = attr.value.clone();
                if attr.name.local.as_ref() == "style" && node.hidden {
                    append_declaration(&mut value, HIDDEN_DECLARATION);
                    wrote_style = true;
                }
                out.push(' ');
                if let Some(prefix) = &attr.name.prefix {
                    out.push_str(prefix.as_ref());
                    out.push(':');
                }
                out.push_str(attr.name.local.as_ref());
                out.push_str("=\"");
                out.push_str(&escape_attr(&value));
                out.push('"');
            }
            if node.hidden && !wrote_style {
                out.push_str(" style=\"");
                out.push_str(HIDDEN_DECLARATION);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in dom.children(id) {
                write_node(dom, child, raw, out);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn append_declaration(style: &mut String, declaration: &str) {
    let trimmed = style.trim_end();
    style.truncate(trimmed.len());
    if !style.is_empty() && !style.ends_with(';') {
        style.push(';');
    }
    if !style.is_empty() {
        style.push(' ');
    }
    style.push_str(declaration);
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}
