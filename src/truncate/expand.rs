//! The "Read more" control: reveals everything the hider took away.

use log::debug;

use super::options::Template;
use crate::dom::{ArenaDom, ArenaNodeId};
use crate::layout::Transition;

/// Callback run once after a control has revealed its container.
pub type ExpandHook = Box<dyn FnOnce()>;

/// An activation aimed at an expand control (a click, in a browser).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationEvent {
    default_prevented: bool,
}

impl ActivationEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the host's default action (following the control's link).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A control node bound to the container it expands.
pub struct ExpandControl {
    container: ArenaNodeId,
    control: ArenaNodeId,
    marker_class: String,
    on_expand: Option<ExpandHook>,
    activated: bool,
}

impl std::fmt::Debug for ExpandControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpandControl")
            .field("container", &self.container)
            .field("control", &self.control)
            .field("marker_class", &self.marker_class)
            .field("on_expand", &self.on_expand.is_some())
            .field("activated", &self.activated)
            .finish()
    }
}

/// Append a fresh copy of `template` to `container` and bind it.
pub fn attach(
    dom: &mut ArenaDom,
    container: ArenaNodeId,
    template: &Template,
    marker_class: &str,
    on_expand: Option<ExpandHook>,
) -> ExpandControl {
    let control = template.instantiate(dom);
    dom.append(container, control);
    debug!("attached expand control {control:?} to {container:?}");

    ExpandControl {
        container,
        control,
        marker_class: marker_class.to_string(),
        on_expand,
        activated: false,
    }
}

impl ExpandControl {
    /// The control's root node in the document.
    pub fn control(&self) -> ArenaNodeId {
        self.control
    }

    pub fn container(&self) -> ArenaNodeId {
        self.container
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Whether `node` is the control or lies inside it.
    pub fn contains(&self, dom: &ArenaDom, node: ArenaNodeId) -> bool {
        !self.activated && (node == self.control || dom.ancestors(node).any(|a| a == self.control))
    }

    /// Remove the control and reveal every hidden marked node.
    ///
    /// Returns the revealed nodes in document order, or `None` if the
    /// control was already used.
    pub fn activate<T: Transition + ?Sized>(
        &mut self,
        dom: &mut ArenaDom,
        transition: &mut T,
        event: &mut ActivationEvent,
    ) -> Option<Vec<ArenaNodeId>> {
        if self.activated {
            return None;
        }
        self.activated = true;
        dom.detach(self.control);

        let revealed: Vec<ArenaNodeId> = dom
            .descendants(self.container)
            .filter(|&id| dom.has_class(id, &self.marker_class) && dom.is_hidden(id))
            .collect();
        transition.reveal(dom, &revealed);
        debug!("revealed {} nodes under {:?}", revealed.len(), self.container);

        if let Some(hook) = self.on_expand.take() {
            hook();
        }
        event.prevent_default();
        Some(revealed)
    }
}
