//! # readmore
//!
//! Progressive "Read more" truncation for HTML documents.
//!
//! Text inside each selected root is cut into small hideable chunks at
//! punctuation boundaries. Chunks are then hidden from the end until the
//! root's measured height fits a budget, and a "Read more" control is
//! appended that brings everything back.
//!
//! ## Quick Start
//!
//! ```
//! use readmore::layout::TextLayout;
//! use readmore::{Options, truncate_html};
//!
//! let html = r#"<div class="post"><p>First. Second. Third. Fourth. Fifth.</p></div>"#;
//! let options = Options::default().with_heights(20.0, 40.0);
//! let layout = TextLayout::new(16, 20.0);
//!
//! let out = truncate_html(html, ".post", &options, &layout).unwrap();
//! assert!(out.contains("display: none"));
//! assert!(out.contains(r#"class="read-more""#));
//! ```
//!
//! ## Working with the tree
//!
//! [`truncate`] runs on a parsed [`ArenaDom`] and returns a [`Session`],
//! which keeps the per-root state and routes later activations:
//!
//! ```
//! use readmore::dom::parse_document;
//! use readmore::layout::{Instant, TextLayout};
//! use readmore::{Options, RootState, truncate_selector};
//!
//! let mut dom = parse_document("<article><p>One. Two. Three. Four.</p></article>");
//! let options = Options::default().with_heights(20.0, 20.0);
//! let layout = TextLayout::new(8, 20.0).with_block_spacing(0.0);
//!
//! let mut session = truncate_selector(&mut dom, "article", &options, &layout).unwrap();
//! let truncation = &session.truncations()[0];
//! assert_eq!(truncation.state(), RootState::Truncated);
//!
//! let control = truncation.control().unwrap().control();
//! assert!(session.activate(&mut dom, control, &mut Instant));
//! assert_eq!(session.truncations()[0].state(), RootState::Expanded);
//! ```

pub mod dom;
pub mod error;
pub mod layout;
pub mod truncate;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use dom::{ArenaDom, ArenaNodeId};
pub use error::{Error, Result};
pub use layout::{Layout, TextLayout, Transition};
#[cfg(feature = "serde")]
pub use truncate::OptionsFile;
pub use truncate::{
    ActivationEvent, Options, RootState, Session, Template, Truncation, truncate,
    truncate_selector,
};

/// Parse `html`, truncate every element matching `selector`, and serialize
/// the resulting document.
pub fn truncate_html<L: Layout + ?Sized>(
    html: &str,
    selector: &str,
    options: &Options,
    layout: &L,
) -> Result<String> {
    let mut dom = dom::parse_document(html);
    truncate_selector(&mut dom, selector, options, layout)?;
    Ok(dom::serialize(&dom, dom.document()))
}
