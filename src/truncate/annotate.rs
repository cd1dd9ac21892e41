//! Boundary annotation: mark hideable elements and split text into chunks.
//!
//! Every descendant element of the root that is not under an
//! `ignore_children` ancestor gets the marker class. Text children of marked
//! elements are then cut at boundary-pattern matches into
//! `<span class="{marker}">` chunks, unless the element is protected or is
//! itself an `ignore_children` tag.

use log::{debug, trace};
use regex_lite::Regex;

use super::options::Options;
use crate::dom::{ArenaDom, ArenaNodeId, Attribute};

/// Tag under which chunks are wrapped.
pub const CHUNK_TAG: &str = "span";

fn tag_in(dom: &ArenaDom, id: ArenaNodeId, tags: &std::collections::HashSet<String>) -> bool {
    dom.element_name(id)
        .is_some_and(|name| tags.contains(name.as_ref()))
}

/// An element is protected when its tag is protected or when one of its
/// direct element children has a protected tag.
pub fn is_protected(dom: &ArenaDom, node: ArenaNodeId, options: &Options) -> bool {
    if options.protected_tags.is_empty() {
        return false;
    }
    tag_in(dom, node, &options.protected_tags)
        || dom
            .element_children(node)
            .any(|child| tag_in(dom, child, &options.protected_tags))
}

/// An element is exempt when a strict ancestor below `root` has an
/// `ignore_children` tag.
pub fn is_exempt(dom: &ArenaDom, node: ArenaNodeId, root: ArenaNodeId, options: &Options) -> bool {
    if options.ignore_children.is_empty() {
        return false;
    }
    dom.ancestors(node)
        .take_while(|&a| a != root)
        .any(|a| tag_in(dom, a, &options.ignore_children))
}

/// Cut `text` after every boundary match.
///
/// The captured group 1 closes the piece it terminates; the rest of the
/// match is dropped. Patterns without a group keep the whole match. Empty
/// pieces are skipped.
pub fn split_text(text: &str, boundary: &Regex) -> Vec<String> {
    let has_group = boundary.captures_len() > 1;
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in boundary.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let delimiter = if has_group {
            caps.get(1).map_or("", |m| m.as_str())
        } else {
            whole.as_str()
        };

        let mut piece = String::with_capacity(whole.start() - last + delimiter.len());
        piece.push_str(&text[last..whole.start()]);
        piece.push_str(delimiter);
        if !piece.is_empty() {
            pieces.push(piece);
        }
        last = whole.end();
    }

    if last < text.len() {
        pieces.push(text[last..].to_string());
    }
    pieces
}

/// Mark and split the subtree under `root` in place.
///
/// Returns true if any element was marked or any chunk created.
pub fn annotate(dom: &mut ArenaDom, root: ArenaNodeId, options: &Options) -> bool {
    let elements: Vec<ArenaNodeId> = dom
        .descendants(root)
        .filter(|&id| dom.is_element(id))
        .collect();

    let mut marked = 0usize;
    let mut chunks = 0usize;

    for id in elements {
        if is_exempt(dom, id, root, options) {
            continue;
        }
        let keep_whole =
            is_protected(dom, id, options) || tag_in(dom, id, &options.ignore_children);

        dom.add_class(id, &options.marker_class);
        marked += 1;

        if keep_whole {
            continue;
        }

        let texts: Vec<ArenaNodeId> = dom.children(id).filter(|&c| dom.is_text(c)).collect();
        for text_id in texts {
            chunks += split_text_node(dom, text_id, options);
        }
    }

    debug!("annotated {root:?}: {marked} elements marked, {chunks} chunks");
    marked > 0 || chunks > 0
}

/// Replace one text node by its chunks. Returns the number of chunks.
fn split_text_node(dom: &mut ArenaDom, text_id: ArenaNodeId, options: &Options) -> usize {
    let pieces = match dom.text_content(text_id) {
        Some(text) if !text.trim().is_empty() => split_text(text, &options.boundary),
        _ => return 0,
    };

    let spans: Vec<ArenaNodeId> = pieces
        .into_iter()
        .map(|piece| {
            trace!("chunk {piece:?}");
            let span = dom.create_html_element(
                CHUNK_TAG,
                vec![Attribute::new("class", options.marker_class.as_str())],
            );
            let text = dom.create_text(piece);
            dom.append(span, text);
            span
        })
        .collect();

    dom.replace_with(text_id, &spans);
    spans.len()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::dom::parse_document;

    fn root_of(dom: &ArenaDom) -> ArenaNodeId {
        dom.get_by_id("r").expect("fixture has a #r root")
    }

    /// Texts of the chunk spans created under `root`, in document order.
    fn chunk_texts(dom: &ArenaDom, root: ArenaNodeId, marker: &str) -> Vec<String> {
        dom.descendants(root)
            .filter(|&id| {
                dom.has_class(id, marker)
                    && dom.element_name(id).is_some_and(|n| n.as_ref() == CHUNK_TAG)
            })
            .map(|id| dom.text_of(id))
            .collect()
    }

    fn plain() -> Options {
        Options::new().with_ignore_children([])
    }

    #[test]
    fn test_split_on_punctuation() {
        let mut dom = parse_document(r#"<div id="r"><p>A.B,C-D</p></div>"#);
        let root = root_of(&dom);
        assert!(annotate(&mut dom, root, &plain()));
        assert_eq!(chunk_texts(&dom, root, "hideme"), ["A.", "B,", "C-", "D"]);
    }

    #[test]
    fn test_split_text_edges() {
        let re = Regex::new(r"(\.)").unwrap();
        assert_eq!(split_text("no boundary", &re), ["no boundary"]);
        assert_eq!(split_text("a..b", &re), ["a.", ".", "b"]);
        assert_eq!(split_text(".a.", &re), [".", "a."]);
        assert!(split_text("", &re).is_empty());
    }

    #[test]
    fn test_split_drops_uncaptured_match_text() {
        let re = Regex::new(r"(\.)\s+").unwrap();
        assert_eq!(split_text("One. Two.", &re), ["One.", "Two."]);
    }

    #[test]
    fn test_split_without_group_keeps_match() {
        let re = Regex::new(r"[.!]").unwrap();
        assert_eq!(split_text("a!b.c", &re), ["a!", "b.", "c"]);
    }

    #[test]
    fn test_whitespace_only_root_is_untouched() {
        let mut dom = parse_document("<div id=\"r\">   \n  </div>");
        let root = root_of(&dom);
        assert!(!annotate(&mut dom, root, &plain()));
        assert_eq!(dom.children(root).count(), 1);
    }

    #[test]
    fn test_whitespace_text_is_not_chunked() {
        let mut dom = parse_document(r#"<div id="r"><p> </p></div>"#);
        let root = root_of(&dom);
        // The <p> is still marked, so annotation reports work done.
        assert!(annotate(&mut dom, root, &plain()));
        assert!(chunk_texts(&dom, root, "hideme").is_empty());
        let p = dom.find_by_tag("p").unwrap();
        assert!(dom.has_class(p, "hideme"));
        assert!(dom.is_text(dom.children(p).next().unwrap()));
    }

    #[test]
    fn test_text_directly_under_root_is_not_split() {
        let mut dom = parse_document(r#"<div id="r">Loose. Text.<p>In. P.</p></div>"#);
        let root = root_of(&dom);
        annotate(&mut dom, root, &plain());
        assert_eq!(chunk_texts(&dom, root, "hideme"), ["In.", " P."]);
        assert_eq!(dom.text_content(dom.children(root).next().unwrap()), Some("Loose. Text."));
    }

    #[test]
    fn test_protected_tag_is_marked_but_not_split() {
        let mut dom = parse_document(r#"<div id="r"><h1>Big. Title, here</h1></div>"#);
        let root = root_of(&dom);
        let options = plain().with_protected_tags(["h1"]);

        assert!(annotate(&mut dom, root, &options));
        let h1 = dom.find_by_tag("h1").unwrap();
        assert!(dom.has_class(h1, "hideme"));
        assert!(chunk_texts(&dom, root, "hideme").is_empty());
        assert_eq!(dom.text_of(h1), "Big. Title, here");
    }

    #[test]
    fn test_protection_propagates_to_parent() {
        let mut dom =
            parse_document(r#"<div id="r"><section>Lead. More.<h2>T.</h2></section></div>"#);
        let root = root_of(&dom);
        let options = plain().with_protected_tags(["h2"]);

        annotate(&mut dom, root, &options);
        let section = dom.find_by_tag("section").unwrap();
        assert!(dom.has_class(section, "hideme"));
        assert!(chunk_texts(&dom, root, "hideme").is_empty());
    }

    #[test]
    fn test_ignore_children_keeps_subtree_whole() {
        let mut dom = parse_document(
            r#"<div id="r"><p>See <a href="">x. y. <em>z. w.</em></a> now. ok</p></div>"#,
        );
        let root = root_of(&dom);
        annotate(&mut dom, root, &Options::default());

        let a = dom.find_by_tag("a").unwrap();
        let em = dom.find_by_tag("em").unwrap();
        assert!(dom.has_class(a, "hideme"));
        assert!(!dom.has_class(em, "hideme"));
        assert_eq!(dom.text_of(a), "x. y. z. w.");
        assert_eq!(chunk_texts(&dom, root, "hideme"), ["See ", " now.", " ok"]);
    }

    #[test]
    fn test_is_exempt_stops_at_root() {
        let dom = parse_document(r#"<strong><div id="r"><p>x</p></div></strong>"#);
        let root = root_of(&dom);
        let p = dom.find_by_tag("p").unwrap();
        assert!(!is_exempt(&dom, p, root, &Options::default()));
        assert!(is_exempt(&dom, p, dom.document(), &Options::default()));
    }

    #[test]
    fn test_custom_marker_class() {
        let mut dom = parse_document(r#"<div id="r"><p>a. b</p></div>"#);
        let root = root_of(&dom);
        annotate(&mut dom, root, &plain().with_marker_class("fold"));
        assert_eq!(chunk_texts(&dom, root, "fold"), ["a.", " b"]);
        assert!(chunk_texts(&dom, root, "hideme").is_empty());
    }

    proptest! {
        #[test]
        fn prop_split_is_lossless(text in "[-a-zA-Z .,!?–]{0,60}") {
            let re = Regex::new(crate::truncate::options::DEFAULT_BOUNDARY).unwrap();
            let pieces = split_text(&text, &re);
            prop_assert_eq!(pieces.concat(), text);
            prop_assert!(pieces.iter().all(|p| !p.is_empty()));
        }

        #[test]
        fn prop_annotation_preserves_text(text in "[-a-z .,!]{1,60}") {
            let html = format!(r#"<div id="r"><p>{text}</p><p><b>{text}</b></p></div>"#);
            let mut dom = parse_document(&html);
            let root = root_of(&dom);
            let before = dom.text_of(root);
            annotate(&mut dom, root, &plain());
            prop_assert_eq!(dom.text_of(root), before);
        }
    }
}
