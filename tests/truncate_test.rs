//! End-to-end truncation tests.
//!
//! Parse real HTML, truncate it with the text-flow layout, then drive the
//! expand controls the way a page would.

use readmore::dom::{SelectorSet, parse_document, serialize};
use readmore::layout::{ClassTransition, Instant, TextLayout};
use readmore::truncate::{DEFAULT_MARKER_CLASS, split_text};
use readmore::{ArenaDom, ArenaNodeId, Options, RootState, truncate, truncate_html};
use readmore::{OptionsFile, truncate_selector};
use tempfile::TempDir;

const ARTICLE: &str = r#"<!DOCTYPE html>
<html><head><title>Post</title></head><body>
<div class="post" id="first">
  <h2>Heading, with a comma</h2>
  <p>The first sentence. The second one, with a clause! A question? Yes - indeed.</p>
  <p>More text follows. It keeps going. And going <a href="/x">to a link. here</a>.</p>
</div>
<div class="post" id="second"><p>Short.</p></div>
</body></html>"#;

fn narrow() -> TextLayout {
    TextLayout::new(24, 20.0).with_block_spacing(10.0)
}

fn options() -> Options {
    Options::default().with_heights(40.0, 80.0)
}

fn hidden_marked(dom: &ArenaDom, root: ArenaNodeId) -> Vec<ArenaNodeId> {
    dom.descendants(root)
        .filter(|&id| dom.has_class(id, DEFAULT_MARKER_CLASS) && dom.is_hidden(id))
        .collect()
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn test_control_present_iff_hidden() {
    let mut dom = parse_document(ARTICLE);
    let session = truncate_selector(&mut dom, ".post", &options(), &narrow()).unwrap();
    assert_eq!(session.len(), 2);

    for truncation in &session {
        let hidden = hidden_marked(&dom, truncation.root());
        let has_control = dom
            .element_children(truncation.root())
            .any(|id| dom.has_class(id, "read-more"));
        assert_eq!(!hidden.is_empty(), has_control);
        assert_eq!(truncation.did_hide(), has_control);
    }

    let first = dom.get_by_id("first").unwrap();
    let second = dom.get_by_id("second").unwrap();
    assert_eq!(session.get(first).unwrap().state(), RootState::Truncated);
    assert_eq!(session.get(second).unwrap().state(), RootState::Fits);
}

#[test]
fn test_truncated_root_fits_budget() {
    let mut dom = parse_document(ARTICLE);
    let layout = narrow();
    let first = dom.get_by_id("first").unwrap();
    let before = readmore::Layout::measure(&layout, &dom, first);

    let session = truncate(&mut dom, [first], &options(), &layout);
    let truncation = session.get(first).unwrap();
    let control = truncation.control().unwrap().control();

    // The control is not part of the budgeted content.
    dom.set_hidden(control, true);
    let after = readmore::Layout::measure(&layout, &dom, first);
    assert!(before > 80.0);
    assert!(after <= 80.0, "height after truncation: {after}");
}

#[test]
fn test_expand_restores_everything() {
    let mut dom = parse_document(ARTICLE);
    let first = dom.get_by_id("first").unwrap();
    let text_before = dom.text_of(first);

    let mut session = truncate(&mut dom, [first], &options(), &narrow());
    let hidden = session.get(first).unwrap().hidden().to_vec();
    let control = session.get(first).unwrap().control().unwrap().control();
    assert!(!hidden.is_empty());

    assert!(session.activate(&mut dom, control, &mut ClassTransition::new("fade-in")));
    assert!(hidden_marked(&dom, first).is_empty());
    assert!(hidden.iter().all(|&id| dom.has_class(id, "fade-in")));
    assert!(dom.parent(control).is_none());
    // Annotation only re-wraps text, so the text is unchanged once expanded.
    assert_eq!(dom.text_of(first), text_before);

    // The control is gone; activating it again does nothing.
    assert!(!session.activate(&mut dom, control, &mut Instant));
    assert_eq!(session.get(first).unwrap().state(), RootState::Expanded);
}

#[test]
fn test_text_is_preserved_in_chunks() {
    let mut dom = parse_document(ARTICLE);
    let first = dom.get_by_id("first").unwrap();
    let p = SelectorSet::parse("#first p").unwrap().select(&dom, first)[0];
    let original = dom.text_of(p);

    truncate(&mut dom, [first], &options(), &narrow());
    assert_eq!(dom.text_of(p), original);
    assert_eq!(
        split_text(&original, &Options::default().boundary).concat(),
        original
    );
}

#[test]
fn test_links_are_never_split() {
    let mut dom = parse_document(ARTICLE);
    let first = dom.get_by_id("first").unwrap();
    truncate(&mut dom, [first], &options(), &narrow());

    let a = dom.find_by_tag("a").unwrap();
    assert!(dom.has_class(a, DEFAULT_MARKER_CLASS));
    assert_eq!(dom.children(a).count(), 1);
    assert!(dom.is_text(dom.children(a).next().unwrap()));
}

#[test]
fn test_whitespace_only_root() {
    let mut dom = parse_document("<div class=\"post\">\n   \n</div>");
    let session = truncate_selector(&mut dom, ".post", &options(), &narrow()).unwrap();
    let truncation = &session.truncations()[0];
    assert_eq!(truncation.state(), RootState::Unmarked);
    assert!(truncation.control().is_none());
}

#[test]
fn test_truncate_html_output() {
    let out = truncate_html(ARTICLE, "#first", &options(), &narrow()).unwrap();
    assert!(out.contains(r#"class="hideme""#));
    assert!(out.contains(r#"style="display: none""#));
    assert!(out.contains(r#"<a href="" class="read-more">Read more</a></div>"#));
}

#[test]
fn test_custom_template_and_marker() {
    let options = options()
        .with_marker_class("fold")
        .with_template_html(r#"<button type="button" class="more">Show all</button>"#)
        .unwrap();
    let out = truncate_html(ARTICLE, "#first", &options, &narrow()).unwrap();
    assert!(out.contains(r#"class="fold""#));
    assert!(!out.contains("hideme"));
    assert!(out.contains(r#"<button type="button" class="more">Show all</button>"#));
}

#[test]
fn test_no_match_leaves_document_alone() {
    let dom = parse_document(ARTICLE);
    let expected = serialize(&dom, dom.document());
    let out = truncate_html(ARTICLE, ".missing", &options(), &narrow()).unwrap();
    assert_eq!(out, expected);
}

// ============================================================================
// Re-entry Tests
// ============================================================================

fn control_count(dom: &ArenaDom, root: ArenaNodeId) -> usize {
    dom.descendants(root)
        .filter(|&id| dom.has_class(id, "read-more"))
        .count()
}

/// Chunk spans whose parent is itself a chunk span.
fn rewrapped_chunks(dom: &ArenaDom) -> usize {
    let is_chunk = |id: ArenaNodeId| {
        dom.has_class(id, DEFAULT_MARKER_CLASS)
            && dom.element_name(id).is_some_and(|n| n.as_ref() == "span")
    };
    dom.descendants(dom.document())
        .filter(|&id| is_chunk(id) && is_chunk(dom.parent(id)))
        .count()
}

#[test]
fn test_second_truncate_leaves_document_alone() {
    let mut dom = parse_document(ARTICLE);
    let first = dom.get_by_id("first").unwrap();
    truncate_selector(&mut dom, ".post", &options(), &narrow()).unwrap();
    let once = serialize(&dom, dom.document());

    let session = truncate_selector(&mut dom, ".post", &options(), &narrow()).unwrap();
    assert!(session.iter().all(|t| t.state() == RootState::Skipped));
    assert_eq!(serialize(&dom, dom.document()), once);
    assert_eq!(control_count(&dom, first), 1);
    assert_eq!(rewrapped_chunks(&dom), 0);
}

#[test]
fn test_nested_matches_truncate_outermost_only() {
    let html = r#"<div id="o"><div id="i"><p>One. Two. Three. Four. Five. Six.</p></div></div>"#;
    let mut dom = parse_document(html);
    let outer = dom.get_by_id("o").unwrap();
    let inner = dom.get_by_id("i").unwrap();
    let options = Options::default().with_heights(20.0, 40.0);
    let layout = TextLayout::new(10, 20.0).with_block_spacing(0.0);

    let session = truncate_selector(&mut dom, "div", &options, &layout).unwrap();
    assert_eq!(session.get(outer).unwrap().state(), RootState::Truncated);
    assert_eq!(session.get(inner).unwrap().state(), RootState::Skipped);
    assert_eq!(control_count(&dom, outer), 1);
    assert_eq!(rewrapped_chunks(&dom), 0);
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_load_options_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("readmore.json");
    std::fs::write(
        &path,
        r#"{
            "min_height": 20,
            "max_height": 60,
            "marker_class": "fold",
            "protected_tags": ["h2"],
            "expand_template": "<span class=\"more\">More</span>"
        }"#,
    )
    .unwrap();

    let options = OptionsFile::load(&path).unwrap().into_options().unwrap();
    assert_eq!(options.min_height, 20.0);
    assert_eq!(options.max_height, 60.0);
    assert_eq!(options.marker_class, "fold");
    assert!(options.protected_tags.contains("h2"));
    assert_eq!(options.expand_template.label(), "More");
    assert!(options.ignore_children.contains("a"));
}

#[test]
fn test_load_options_file_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        OptionsFile::load(&missing),
        Err(readmore::Error::Io(_))
    ));

    let inverted = dir.path().join("inverted.json");
    std::fs::write(&inverted, r#"{"min_height": 300, "max_height": 100}"#).unwrap();
    let result = OptionsFile::load(&inverted).unwrap().into_options();
    assert!(matches!(result, Err(readmore::Error::InvalidConfig(_))));

    let bad_pattern = dir.path().join("pattern.json");
    std::fs::write(&bad_pattern, r#"{"boundary": "(["}"#).unwrap();
    let result = OptionsFile::load(&bad_pattern).unwrap().into_options();
    assert!(matches!(result, Err(readmore::Error::InvalidPattern(_))));
}
