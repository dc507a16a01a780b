//! Pre-rewrite snapshots of text-bearing nodes.
//!
//! Capture records flattened text and inner markup per qualifying node, in
//! traversal order; that order later drives rewritten-segment assignment.
//! Restore writes the recorded markup back verbatim and clears the store.
//! The session controller guarantees capture runs only while the document is
//! still original; a second capture mid-session would snapshot rewritten text
//! and corrupt the revert path.

use relevel_core::{DocumentHost, NodeHandle};

/// Nodes at or below this flattened-text length are not worth snapshotting
/// (icons, whitespace, decorative fragments).
pub const MIN_SNAPSHOT_CHARS: usize = 10;

#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub handle: NodeHandle,
    /// Flattened text at capture time.
    pub text: String,
    /// Inner markup at capture time, restored verbatim on reset.
    pub markup: String,
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: Vec<NodeSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and repopulate from the host's text blocks, in document order.
    pub fn capture<H: DocumentHost + ?Sized>(&mut self, host: &H) {
        self.snapshots.clear();
        for handle in host.text_blocks() {
            let Some(text) = host.flattened_text(handle) else {
                continue;
            };
            if text.trim().chars().count() <= MIN_SNAPSHOT_CHARS {
                continue;
            }
            let Some(markup) = host.inner_markup(handle) else {
                continue;
            };
            self.snapshots.push(NodeSnapshot {
                handle,
                text,
                markup,
            });
        }
    }

    /// Write every recorded node's original markup back, then clear.
    pub fn restore<H: DocumentHost + ?Sized>(&mut self, host: &mut H) {
        for snap in &self.snapshots {
            host.set_inner_markup(snap.handle, &snap.markup);
        }
        self.snapshots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeSnapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;
    use relevel_core::NodeQuery;

    #[test]
    fn capture_skips_short_nodes_and_keeps_order() {
        let doc = HtmlDocument::parse(
            "<body><p>A first paragraph with plenty of text.</p><li>Menu</li><p>The second paragraph, also long enough.</p></body>",
        );
        let mut store = SnapshotStore::new();
        store.capture(&doc);
        let texts: Vec<&str> = store.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "A first paragraph with plenty of text.",
                "The second paragraph, also long enough."
            ]
        );
    }

    #[test]
    fn restore_puts_markup_back_and_empties_the_store() {
        let mut doc = HtmlDocument::parse(
            "<body><p>Original <em>styled</em> paragraph text here.</p></body>",
        );
        let p = doc.query_first(&NodeQuery::Tag("p")).unwrap();
        let before = doc.inner_markup(p).unwrap();

        let mut store = SnapshotStore::new();
        store.capture(&doc);
        assert_eq!(store.len(), 1);

        doc.set_text(p, "mutated");
        store.restore(&mut doc);
        assert_eq!(doc.inner_markup(p).unwrap(), before);
        assert!(store.is_empty());
    }
}
