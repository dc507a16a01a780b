//! Reinsertion of rewritten text into snapshotted nodes.
//!
//! The rewritten payload has no canonical link back to source nodes, so the
//! mapping is positional: blank-line-delimited segments are handed out to
//! snapshots in capture order. When segments run out the final segment is
//! reused, so no large text block is ever left untouched, at the cost of
//! duplicate content for the excess nodes.

use crate::dom::HtmlDocument;
use crate::snapshot::{NodeSnapshot, SnapshotStore};
use relevel_core::{DocumentHost, NodeHandle};

/// Nodes whose original flattened text is at or below this length are left
/// untouched: labels, buttons, and short fragments are not worth rewriting
/// and risk structural breakage.
pub const MIN_REWRITE_CHARS: usize = 20;

/// Split rewritten text on runs of blank lines into trimmed segments.
pub fn split_segments(rewritten: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for line in rewritten.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                segments.push(current.trim().to_string());
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        segments.push(current.trim().to_string());
    }
    segments
}

/// Distribute `rewritten` across the snapshotted nodes and mutate the host.
///
/// Returns the mutated handles, in the order they were touched. Mutation is
/// synchronous and all-or-nothing per node; an empty segment list leaves the
/// document untouched.
pub fn apply<H: DocumentHost + ?Sized>(
    host: &mut H,
    store: &SnapshotStore,
    rewritten: &str,
) -> Vec<NodeHandle> {
    let segments = split_segments(rewritten);
    if segments.is_empty() {
        return Vec::new();
    }

    let mut next = 0usize;
    let mut mutated = Vec::new();
    for snap in store.iter() {
        if snap.text.trim().chars().count() <= MIN_REWRITE_CHARS {
            continue;
        }
        // Past the end, keep reusing the final segment.
        let segment = &segments[next.min(segments.len() - 1)];
        next += 1;
        replace_node_text(host, snap, segment);
        mutated.push(snap.handle);
    }
    mutated
}

fn replace_node_text<H: DocumentHost + ?Sized>(host: &mut H, snap: &NodeSnapshot, segment: &str) {
    // A plain-text leaf (markup identical to its flattened text) can be
    // replaced directly. Anything else gets a structure-preserving edit.
    if snap.markup == snap.text {
        host.set_text(snap.handle, segment);
        return;
    }
    match rewrite_first_text_leaf(&snap.markup, segment) {
        Some(markup) => host.set_inner_markup(snap.handle, &markup),
        None => host.set_text(snap.handle, segment),
    }
}

/// Overwrite the first non-whitespace text leaf in a detached copy of
/// `markup`, preserving surrounding tags and attributes. `None` when the
/// markup holds no usable text leaf.
fn rewrite_first_text_leaf(markup: &str, replacement: &str) -> Option<String> {
    let mut scratch = HtmlDocument::parse_fragment(markup);
    let leaf = scratch.first_text_leaf()?;
    scratch.set_text_node_value(leaf, replacement);
    Some(scratch.markup())
}
