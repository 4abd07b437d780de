//! Expand/collapse notifications.
//!
//! Engine operations never call the listener while the flat sequence is
//! being edited. Events are queued during the edit and delivered when the
//! outermost operation has finished. A listener may call back into the tree;
//! events raised by those nested calls join the same queue and are delivered
//! after the current callback returns.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::node::ParentId;
use crate::tree::FlatTree;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpansionKind {
    Expanded,
    Collapsed,
}

/// Notification emitted once per state change of a parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionEvent {
    pub kind: ExpansionKind,
    pub parent: ParentId,
    /// Caller-assigned depth key of the parent.
    pub depth: usize,
    /// Position with the child rows preceding the parent subtracted out.
    pub logical_position: usize,
}

impl ExpansionEvent {
    pub fn is_expanded(&self) -> bool {
        self.kind == ExpansionKind::Expanded
    }
}

/// Callback registered with [`FlatTree::set_listener`].
pub type Listener<P, L> = dyn FnMut(&mut FlatTree<P, L>, &ExpansionEvent);

#[derive(Default)]
pub(crate) struct EventQueue {
    pending: VecDeque<ExpansionEvent>,
    dispatching: bool,
    /// Bumped whenever the listener is set or cleared.
    epoch: u64,
}

impl EventQueue {
    pub(crate) fn push(&mut self, event: ExpansionEvent) {
        self.pending.push_back(event);
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<P, L> FlatTree<P, L> {
    /// Register the listener, replacing any previous one.
    pub fn set_listener(
        &mut self,
        listener: impl FnMut(&mut FlatTree<P, L>, &ExpansionEvent) + 'static,
    ) {
        self.listener = Some(Box::new(listener));
        self.events.epoch += 1;
    }

    /// Remove the registered listener, if any.
    pub fn clear_listener(&mut self) {
        self.listener = None;
        self.events.epoch += 1;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Deliver queued events unless a delivery loop is already running
    /// further up the stack.
    pub(crate) fn flush_events(&mut self) {
        if self.events.dispatching {
            return;
        }

        let Some(mut listener) = self.listener.take() else {
            self.events.clear();
            return;
        };

        let epoch = self.events.epoch;
        self.events.dispatching = true;
        while let Some(event) = self.events.pending.pop_front() {
            log::trace!(
                "delivering {:?} for parent {} at logical position {}",
                event.kind,
                event.parent,
                event.logical_position
            );
            listener(self, &event);
        }
        self.events.dispatching = false;

        // A callback that set or cleared the listener wins.
        if self.events.epoch == epoch {
            self.listener = Some(listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::node::ParentNode;

    fn tree() -> FlatTree<&'static str, &'static str> {
        FlatTree::new([
            ParentNode::new("a", 1).with_leaf("a1").with_leaf("a2"),
            ParentNode::new("b", 1).with_leaf("b1"),
        ])
    }

    #[test]
    fn given_listener_when_toggled_twice_then_one_event_per_change() {
        let mut tree = tree();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        tree.set_listener(move |_, event| sink.borrow_mut().push(*event));

        let a = tree.roots()[0];
        tree.toggle(a, 0);
        tree.toggle(a, 0);

        let kinds: Vec<ExpansionKind> =
            seen.borrow().iter().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            vec![ExpansionKind::Expanded, ExpansionKind::Collapsed]
        );
        assert!(seen.borrow().iter().all(|event| event.parent == a));
    }

    #[test]
    fn given_listener_when_notified_then_sequence_is_already_updated() {
        let mut tree = tree();
        let lengths = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&lengths);
        tree.set_listener(move |tree, _| {
            sink.borrow_mut().push(tree.item_count());
        });

        let b = tree.roots()[1];
        tree.toggle(b, 1);

        assert_eq!(*lengths.borrow(), vec![3]);
    }

    #[test]
    fn given_reentrant_listener_when_expanding_then_nested_toggle_sees_consistent_state()
     {
        let mut tree = tree();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        tree.set_listener(move |tree, event| {
            sink.borrow_mut().push(*event);
            // Expanding `a` also expands `b`, which now sits after a's rows.
            if event.is_expanded() && event.logical_position == 0 {
                let b = tree.roots()[1];
                let position = tree.position_of(b).expect("b is visible");
                tree.expand_if_collapsed(b, position);
            }
        });

        let a = tree.roots()[0];
        tree.toggle(a, 0);

        assert_eq!(tree.item_count(), 5);
        let events = seen.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].parent, tree.roots()[1]);
        assert_eq!(events[1].logical_position, 1);
    }

    #[test]
    fn given_listener_clearing_itself_when_notified_then_it_stays_cleared() {
        let mut tree = tree();
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        tree.set_listener(move |tree, _| {
            *sink.borrow_mut() += 1;
            tree.clear_listener();
        });

        let a = tree.roots()[0];
        tree.toggle(a, 0);
        tree.toggle(a, 0);

        assert!(!tree.has_listener());
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn given_listener_cleared_when_toggled_then_nothing_is_delivered() {
        let mut tree = tree();
        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        tree.set_listener(move |_, _| *sink.borrow_mut() += 1);
        tree.clear_listener();

        let a = tree.roots()[0];
        tree.toggle(a, 0);

        assert!(!tree.has_listener());
        assert_eq!(*seen.borrow(), 0);
    }
}
