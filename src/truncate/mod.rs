//! Progressive truncation.
//!
//! Each root goes through three stages, driven by a [`Truncation`]:
//!
//! 1. [`annotate`] marks hideable elements and splits their text into chunks
//!    at boundary-pattern matches.
//! 2. [`hide_chunks`] hides marked nodes from the end while the measured
//!    height says the root is too tall.
//! 3. [`attach`] adds an expand control, only if something was hidden.
//!    Activating it reveals the hidden nodes and removes the control.
//!
//! [`truncate`] runs this over many roots and returns a [`Session`] that
//! routes later activations to the right root.

mod annotate;
mod expand;
mod hide;
mod options;

pub use annotate::{CHUNK_TAG, annotate, is_exempt, is_protected, split_text};
pub use expand::{ActivationEvent, ExpandControl, ExpandHook, attach};
pub use hide::{hide, hide_chunks};
#[cfg(feature = "serde")]
pub use options::OptionsFile;
pub use options::{
    DEFAULT_BOUNDARY, DEFAULT_IGNORE_CHILDREN, DEFAULT_MARKER_CLASS, DEFAULT_TEMPLATE_HTML,
    Options, Template,
};

use log::{debug, info};

use crate::dom::{ArenaDom, ArenaNodeId, SelectorSet};
use crate::error::Result;
use crate::layout::{Layout, Transition};

/// Where a root is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    /// Not run yet.
    Unprocessed,
    /// Annotation found nothing to mark. Terminal.
    Unmarked,
    /// Annotated, hiding not yet decided.
    Marked,
    /// Annotated, but nothing had to be hidden. Terminal.
    Fits,
    /// Content hidden and the expand control attached.
    Truncated,
    /// The expand control was used. Terminal.
    Expanded,
    /// The root already held marked content, or lies inside a root
    /// processed earlier. Left untouched. Terminal.
    Skipped,
}

/// Per-root truncation context.
pub struct Truncation {
    root: ArenaNodeId,
    state: RootState,
    did_hide: bool,
    hidden: Vec<ArenaNodeId>,
    control: Option<ExpandControl>,
    on_expand: Option<ExpandHook>,
}

impl std::fmt::Debug for Truncation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Truncation")
            .field("root", &self.root)
            .field("state", &self.state)
            .field("did_hide", &self.did_hide)
            .field("hidden", &self.hidden)
            .field("control", &self.control)
            .finish_non_exhaustive()
    }
}

impl Truncation {
    pub fn new(root: ArenaNodeId) -> Self {
        Self {
            root,
            state: RootState::Unprocessed,
            did_hide: false,
            hidden: Vec::new(),
            control: None,
            on_expand: None,
        }
    }

    /// Run `hook` once when the root is expanded.
    pub fn with_on_expand(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_expand = Some(Box::new(hook));
        self
    }

    /// Annotate, hide and attach the control as needed.
    ///
    /// A root is processed at most once; later calls leave the tree alone
    /// and return the current state.
    pub fn run<L: Layout + ?Sized>(
        &mut self,
        dom: &mut ArenaDom,
        options: &Options,
        layout: &L,
    ) -> RootState {
        if self.state != RootState::Unprocessed {
            debug!("{:?} already processed ({:?})", self.root, self.state);
            return self.state;
        }

        if already_marked(dom, self.root, &options.marker_class) {
            debug!("{:?} already holds marked content, skipping", self.root);
            self.state = RootState::Skipped;
            return self.state;
        }

        if !annotate(dom, self.root, options) {
            self.state = RootState::Unmarked;
            return self.state;
        }
        self.state = RootState::Marked;

        self.hidden = hide_chunks(
            dom,
            self.root,
            &options.marker_class,
            options.min_height,
            options.max_height,
            layout,
        );
        self.did_hide = !self.hidden.is_empty();
        if !self.did_hide {
            self.state = RootState::Fits;
            return self.state;
        }

        self.control = Some(attach(
            dom,
            self.root,
            &options.expand_template,
            &options.marker_class,
            self.on_expand.take(),
        ));
        self.state = RootState::Truncated;
        self.state
    }

    /// Activate the expand control. Returns the revealed nodes, or `None`
    /// if the root is not currently truncated.
    pub fn expand<T: Transition + ?Sized>(
        &mut self,
        dom: &mut ArenaDom,
        transition: &mut T,
        event: &mut ActivationEvent,
    ) -> Option<Vec<ArenaNodeId>> {
        if self.state != RootState::Truncated {
            return None;
        }
        let revealed = self.control.as_mut()?.activate(dom, transition, event)?;
        self.state = RootState::Expanded;
        self.did_hide = false;
        self.hidden.clear();
        Some(revealed)
    }

    pub fn root(&self) -> ArenaNodeId {
        self.root
    }

    pub fn state(&self) -> RootState {
        self.state
    }

    /// Whether content is currently hidden by this truncation.
    pub fn did_hide(&self) -> bool {
        self.did_hide
    }

    /// Nodes hidden by the last run, in hiding order (last chunk first).
    pub fn hidden(&self) -> &[ArenaNodeId] {
        &self.hidden
    }

    /// The expand control, if one was attached.
    pub fn control(&self) -> Option<&ExpandControl> {
        self.control.as_ref()
    }
}

/// Truncations of several roots sharing one document.
#[derive(Debug, Default)]
pub struct Session {
    truncations: Vec<Truncation>,
}

impl Session {
    /// Deliver an activation aimed at `target`.
    ///
    /// The event bubbles from `target` through its ancestors until it
    /// reaches a live expand control. Returns whether a control handled it.
    pub fn activate<T: Transition + ?Sized>(
        &mut self,
        dom: &mut ArenaDom,
        target: ArenaNodeId,
        transition: &mut T,
    ) -> bool {
        self.dispatch(dom, target, transition, &mut ActivationEvent::new())
    }

    /// Like [`Session::activate`], with a caller-supplied event.
    pub fn dispatch<T: Transition + ?Sized>(
        &mut self,
        dom: &mut ArenaDom,
        target: ArenaNodeId,
        transition: &mut T,
        event: &mut ActivationEvent,
    ) -> bool {
        let owner = self.truncations.iter_mut().find(|t| {
            t.state == RootState::Truncated
                && t.control.as_ref().is_some_and(|c| c.contains(dom, target))
        });
        match owner {
            Some(truncation) => truncation.expand(dom, transition, event).is_some(),
            None => false,
        }
    }

    /// Expand every truncated root. Returns how many were expanded.
    pub fn expand_all<T: Transition + ?Sized>(
        &mut self,
        dom: &mut ArenaDom,
        transition: &mut T,
    ) -> usize {
        self.truncations
            .iter_mut()
            .filter_map(|t| t.expand(dom, transition, &mut ActivationEvent::new()))
            .count()
    }

    pub fn truncations(&self) -> &[Truncation] {
        &self.truncations
    }

    /// The truncation owning `root`.
    pub fn get(&self, root: ArenaNodeId) -> Option<&Truncation> {
        self.truncations.iter().find(|t| t.root == root)
    }

    pub fn len(&self) -> usize {
        self.truncations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truncations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Truncation> {
        self.truncations.iter()
    }
}

impl<'a> IntoIterator for &'a Session {
    type Item = &'a Truncation;
    type IntoIter = std::slice::Iter<'a, Truncation>;

    fn into_iter(self) -> Self::IntoIter {
        self.truncations.iter()
    }
}

/// Whether `root` or any of its descendants already carries the marker.
fn already_marked(dom: &ArenaDom, root: ArenaNodeId, marker_class: &str) -> bool {
    dom.has_class(root, marker_class)
        || dom
            .descendants(root)
            .any(|id| dom.has_class(id, marker_class))
}

/// Truncate each root independently.
///
/// Content is annotated at most once: a root nested inside a root
/// processed earlier in the same call, or one that already holds marked
/// content from a previous call, ends up [`RootState::Skipped`].
pub fn truncate<L: Layout + ?Sized>(
    dom: &mut ArenaDom,
    roots: impl IntoIterator<Item = ArenaNodeId>,
    options: &Options,
    layout: &L,
) -> Session {
    let mut truncations: Vec<Truncation> = Vec::new();
    for root in roots {
        if truncations.iter().any(|t| t.root == root) {
            continue;
        }
        let mut truncation = Truncation::new(root);
        let nested = dom
            .ancestors(root)
            .any(|a| truncations.iter().any(|t| t.root == a));
        if nested {
            debug!("{root:?} lies inside a processed root, skipping");
            truncation.state = RootState::Skipped;
        } else {
            truncation.run(dom, options, layout);
        }
        truncations.push(truncation);
    }

    let truncated = truncations
        .iter()
        .filter(|t| t.state == RootState::Truncated)
        .count();
    info!("truncated {truncated} of {} roots", truncations.len());
    Session { truncations }
}

/// Truncate every element matching `selector`.
pub fn truncate_selector<L: Layout + ?Sized>(
    dom: &mut ArenaDom,
    selector: &str,
    options: &Options,
    layout: &L,
) -> Result<Session> {
    let roots = SelectorSet::parse(selector)?.select(dom, dom.document());
    Ok(truncate(dom, roots, options, layout))
}
