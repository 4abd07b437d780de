//! Keep at most one expanded parent per depth key.

use crate::event::{ExpansionEvent, Listener};
use crate::tree::{FlatItem, FlatTree};

/// Listener policy that collapses same-depth parents when one expands.
///
/// Depth is the caller-assigned key on [`crate::ParentNode`]; it is not
/// checked against the real nesting level. Only `Expanded` events for a
/// parent that is still expanded at delivery time trigger the scan, so the
/// collapses it performs never cascade and a batch of same-depth expansions
/// leaves the first one open.
pub struct SingleExpandedSibling<P, L> {
    enabled: bool,
    downstream: Option<Box<Listener<P, L>>>,
}

impl<P, L> Default for SingleExpandedSibling<P, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, L> SingleExpandedSibling<P, L> {
    pub fn new() -> Self {
        Self {
            enabled: true,
            downstream: None,
        }
    }

    /// Forward every event, including the collapses performed by this
    /// policy, to `listener` once the policy has handled it.
    pub fn then(
        mut self,
        listener: impl FnMut(&mut FlatTree<P, L>, &ExpansionEvent) + 'static,
    ) -> Self {
        self.downstream = Some(Box::new(listener));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register the policy as the tree's listener.
    pub fn install(mut self, tree: &mut FlatTree<P, L>)
    where
        P: 'static,
        L: 'static,
    {
        tree.set_listener(move |tree, event| self.handle(tree, event));
    }

    /// React to a single event.
    pub fn handle(
        &mut self,
        tree: &mut FlatTree<P, L>,
        event: &ExpansionEvent,
    ) {
        // Events are delivered after the operation that raised them, so an
        // earlier event in the same batch may already have closed this one.
        let still_expanded = tree
            .parent(event.parent)
            .is_ok_and(|parent| parent.expanded);
        if self.enabled && event.is_expanded() && still_expanded {
            collapse_same_depth(tree, event);
        }
        if let Some(downstream) = self.downstream.as_mut() {
            downstream(tree, event);
        }
    }
}

fn collapse_same_depth<P, L>(
    tree: &mut FlatTree<P, L>,
    event: &ExpansionEvent,
) {
    let mut collapsed = 0usize;
    // Walk backwards: a collapse only shifts rows after it.
    let mut position = tree.item_count();
    while position > 0 {
        position -= 1;
        let target = match tree.item_at(position) {
            Ok(FlatItem::Parent(parent))
                if parent.expanded
                    && parent.id != event.parent
                    && parent.depth == event.depth =>
            {
                parent.id
            },
            _ => continue,
        };
        tree.collapse_if_expanded(target, position);
        collapsed += 1;
    }
    if collapsed > 0 {
        log::debug!(
            "collapsed {collapsed} siblings at depth {} after {} expanded",
            event.depth,
            event.parent
        );
    }
}

/// Collapse every expanded parent whose depth key equals `depth`.
///
/// Hosts call this when switching the policy on, so that the tree starts
/// from a state the policy would have produced.
pub fn collapse_depth<P, L>(
    tree: &mut FlatTree<P, L>,
    depth: usize,
) -> usize {
    let mut collapsed = 0usize;
    let mut position = tree.item_count();
    while position > 0 {
        position -= 1;
        let target = match tree.item_at(position) {
            Ok(FlatItem::Parent(parent))
                if parent.expanded && parent.depth == depth =>
            {
                parent.id
            },
            _ => continue,
        };
        tree.collapse_if_expanded(target, position);
        collapsed += 1;
    }
    collapsed
}
