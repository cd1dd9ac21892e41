//! Rendering capabilities the truncation pipeline depends on.
//!
//! [`Layout`] reports a node's rendered height and must reflect every
//! mutation made so far. [`Transition`] reveals hidden nodes. In a browser
//! these map onto the host's layout engine and animation API; for static
//! HTML this module provides [`TextLayout`], a deterministic text-flow
//! estimator, and two transitions.

use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// Measures rendered extent.
pub trait Layout {
    /// Current rendered height of `node`. Hidden content contributes nothing.
    fn measure(&self, dom: &ArenaDom, node: ArenaNodeId) -> f32;
}

impl<F> Layout for F
where
    F: Fn(&ArenaDom, ArenaNodeId) -> f32,
{
    fn measure(&self, dom: &ArenaDom, node: ArenaNodeId) -> f32 {
        self(dom, node)
    }
}

/// Reveals a batch of hidden nodes. Fire-and-forget: implementations must
/// leave every node visible when they return, even if an effect is still
/// playing.
pub trait Transition {
    fn reveal(&mut self, dom: &mut ArenaDom, nodes: &[ArenaNodeId]);
}

/// Shows nodes immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Instant;

impl Transition for Instant {
    fn reveal(&mut self, dom: &mut ArenaDom, nodes: &[ArenaNodeId]) {
        for &node in nodes {
            dom.set_hidden(node, false);
        }
    }
}

/// Shows nodes and tags them with a class, so a stylesheet can animate
/// them in (e.g. an opacity keyframe).
#[derive(Debug, Clone)]
pub struct ClassTransition {
    pub class: String,
}

impl ClassTransition {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }
}

impl Transition for ClassTransition {
    fn reveal(&mut self, dom: &mut ArenaDom, nodes: &[ArenaNodeId]) {
        for &node in nodes {
            dom.set_hidden(node, false);
            dom.add_class(node, &self.class);
        }
    }
}

/// Block-level elements: they start a new line box.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tr", "ul",
];

/// Block-level elements that also carry vertical margins.
const SPACED_ELEMENTS: &[&str] = &[
    "blockquote", "dl", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "ol", "p", "pre",
    "table", "ul",
];

/// Elements that are never rendered.
const NON_RENDERED: &[&str] = &["head", "script", "style", "template", "title", "noscript"];

/// Monospace text-flow height estimator.
///
/// Inline content fills line boxes of `chars_per_line` characters with
/// whitespace collapsed; block-level elements close the current line box,
/// lay out their own content, and add `block_spacing` when they carry
/// margins. `<br>` ends a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub chars_per_line: usize,
    pub line_height: f32,
    pub block_spacing: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            chars_per_line: 80,
            line_height: 20.0,
            block_spacing: 10.0,
        }
    }
}

impl TextLayout {
    pub fn new(chars_per_line: usize, line_height: f32) -> Self {
        Self {
            chars_per_line: chars_per_line.max(1),
            line_height,
            ..Default::default()
        }
    }

    pub fn with_block_spacing(mut self, spacing: f32) -> Self {
        self.block_spacing = spacing;
        self
    }

    fn flow_node(&self, dom: &ArenaDom, id: ArenaNodeId, flow: &mut Flow) {
        let Some(node) = dom.get(id) else {
            return;
        };
        if node.hidden {
            return;
        }

        match &node.data {
            ArenaNodeData::Text(text) => flow.push_text(text),
            ArenaNodeData::Element { name, .. } => {
                let tag = name.local.as_ref();
                if NON_RENDERED.contains(&tag) {
                    return;
                }
                if tag == "br" {
                    flow.break_line(self);
                } else if BLOCK_ELEMENTS.contains(&tag) {
                    flow.flush(self);
                    flow.height += self.block_height(dom, id, tag);
                } else {
                    for child in dom.children(id) {
                        self.flow_node(dom, child, flow);
                    }
                }
            }
            ArenaNodeData::Document => {
                for child in dom.children(id) {
                    self.flow_node(dom, child, flow);
                }
            }
            ArenaNodeData::Comment(_) | ArenaNodeData::Doctype { .. } => {}
        }
    }

    fn content_height(&self, dom: &ArenaDom, id: ArenaNodeId) -> f32 {
        let mut flow = Flow::default();
        for child in dom.children(id) {
            self.flow_node(dom, child, &mut flow);
        }
        flow.flush(self);
        flow.height
    }

    fn block_height(&self, dom: &ArenaDom, id: ArenaNodeId, tag: &str) -> f32 {
        let content = if tag == "hr" {
            0.0
        } else {
            self.content_height(dom, id)
        };
        if SPACED_ELEMENTS.contains(&tag) {
            content + self.block_spacing
        } else {
            content
        }
    }
}

impl Layout for TextLayout {
    fn measure(&self, dom: &ArenaDom, node: ArenaNodeId) -> f32 {
        if dom.is_rendered_hidden(node, ArenaNodeId::NONE) {
            return 0.0;
        }
        match dom.get(node).map(|n| &n.data) {
            Some(ArenaNodeData::Text(_)) => {
                let mut flow = Flow::default();
                self.flow_node(dom, node, &mut flow);
                flow.flush(self);
                flow.height
            }
            Some(_) => self.content_height(dom, node),
            None => 0.0,
        }
    }
}

/// Line-box accumulator.
#[derive(Debug, Default)]
struct Flow {
    height: f32,
    chars: usize,
    pending_space: bool,
}

impl Flow {
    fn push_text(&mut self, text: &str) {
        let leading = text.starts_with(char::is_whitespace);
        let mut words = text.split_whitespace().peekable();
        if words.peek().is_none() {
            self.pending_space |= !text.is_empty();
            return;
        }

        for (i, word) in words.enumerate() {
            if self.chars > 0 && (i > 0 || leading || self.pending_space) {
                self.chars += 1;
            }
            self.chars += word.chars().count();
            self.pending_space = false;
        }
        self.pending_space = text.ends_with(char::is_whitespace);
    }

    fn flush(&mut self, layout: &TextLayout) {
        if self.chars > 0 {
            let lines = self.chars.div_ceil(layout.chars_per_line.max(1));
            self.height += lines as f32 * layout.line_height;
        }
        self.chars = 0;
        self.pending_space = false;
    }

    fn break_line(&mut self, layout: &TextLayout) {
        if self.chars == 0 {
            self.height += layout.line_height;
        }
        self.flush(layout);
    }
}
