//! Chunk hiding: hide marked nodes from the end until the container fits.

use log::{debug, trace};

use crate::dom::{ArenaDom, ArenaNodeId};
use crate::layout::Layout;

/// Hide marked descendants of `container`, last first, while it is too tall.
///
/// The container is re-measured before every decision. Hiding stops as soon
/// as the height is at most `min_height`, or when a chunk would be kept: the
/// height is within `max_height`, non-zero, and the chunk still has visible
/// content. Returns the hidden nodes in hiding order.
pub fn hide_chunks<L: Layout + ?Sized>(
    dom: &mut ArenaDom,
    container: ArenaNodeId,
    marker_class: &str,
    min_height: f32,
    max_height: f32,
    layout: &L,
) -> Vec<ArenaNodeId> {
    let marked: Vec<ArenaNodeId> = dom
        .descendants(container)
        .filter(|&id| dom.has_class(id, marker_class))
        .collect();

    let mut hidden = Vec::new();
    for &chunk in marked.iter().rev() {
        let height = layout.measure(dom, container);
        if height <= min_height {
            trace!("{container:?} at {height}, within min height {min_height}");
            break;
        }

        if height > max_height || height == 0.0 || content_hidden(dom, chunk) {
            dom.set_hidden(chunk, true);
            hidden.push(chunk);
        } else {
            trace!("{container:?} at {height}, keeping {chunk:?}");
            break;
        }
    }

    debug!(
        "hid {} of {} marked nodes under {container:?}",
        hidden.len(),
        marked.len()
    );
    hidden
}

/// Like [`hide_chunks`], reporting only whether anything was hidden.
pub fn hide<L: Layout + ?Sized>(
    dom: &mut ArenaDom,
    container: ArenaNodeId,
    marker_class: &str,
    min_height: f32,
    max_height: f32,
    layout: &L,
) -> bool {
    !hide_chunks(dom, container, marker_class, min_height, max_height, layout).is_empty()
}

/// True when `chunk` has descendant elements and none of them is rendered.
fn content_hidden(dom: &ArenaDom, chunk: ArenaNodeId) -> bool {
    let mut elements = dom
        .descendants(chunk)
        .filter(|&id| dom.is_element(id))
        .peekable();
    elements.peek().is_some() && elements.all(|id| dom.is_rendered_hidden(id, chunk))
}
