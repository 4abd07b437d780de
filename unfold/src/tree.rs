use std::fmt;

use log::{debug, trace};

use crate::delta::{FlatChange, FlatDelta};
use crate::error::{Error, Result};
use crate::event::{EventQueue, ExpansionEvent, ExpansionKind, Listener};
use crate::node::{Child, ItemKind, ParentId, ParentNode};
use crate::options::FlatTreeOptions;

/// Attached parent: payload plus handles of its children.
struct ParentSlot<P> {
    data: P,
    depth: usize,
    children: Vec<NodeRef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeRef {
    Parent(ParentId),
    Leaf(usize),
}

/// One row of the flat sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlatEntry {
    Parent { id: ParentId, expanded: bool },
    Child(usize),
}

impl From<NodeRef> for FlatEntry {
    fn from(node: NodeRef) -> Self {
        match node {
            NodeRef::Parent(id) => FlatEntry::Parent {
                id,
                expanded: false,
            },
            NodeRef::Leaf(index) => FlatEntry::Child(index),
        }
    }
}

/// Parent row as seen by the view layer.
#[derive(Debug)]
pub struct ParentItem<'a, P> {
    pub id: ParentId,
    pub data: &'a P,
    pub depth: usize,
    pub expanded: bool,
    pub child_count: usize,
}

/// Row of the flat sequence.
#[derive(Debug)]
pub enum FlatItem<'a, P, L> {
    Parent(ParentItem<'a, P>),
    Child(&'a L),
}

impl<'a, P, L> FlatItem<'a, P, L> {
    pub fn kind(&self) -> ItemKind {
        match self {
            FlatItem::Parent(_) => ItemKind::Parent,
            FlatItem::Child(_) => ItemKind::Child,
        }
    }

    pub fn as_parent(&self) -> Option<&ParentItem<'a, P>> {
        match self {
            FlatItem::Parent(parent) => Some(parent),
            FlatItem::Child(_) => None,
        }
    }

    pub fn as_child(&self) -> Option<&'a L> {
        match self {
            FlatItem::Child(leaf) => Some(*leaf),
            FlatItem::Parent(_) => None,
        }
    }
}

/// Flat, randomly indexed projection of an expandable tree.
///
/// The sequence starts with one collapsed row per root. Expanding a parent
/// inserts one row per direct child right after it; nested parents start
/// collapsed. Collapsing removes the parent's whole visible subtree.
pub struct FlatTree<P, L> {
    options: FlatTreeOptions,
    parents: Vec<ParentSlot<P>>,
    leaves: Vec<L>,
    roots: Vec<ParentId>,
    entries: Vec<FlatEntry>,
    id_base: u64,
    next_id: u64,
    pub(crate) listener: Option<Box<Listener<P, L>>>,
    pub(crate) events: EventQueue,
}

impl<P, L> FlatTree<P, L> {
    pub fn new(roots: impl IntoIterator<Item = ParentNode<P, L>>) -> Self {
        Self::with_options(roots, FlatTreeOptions::default())
    }

    pub fn with_options(
        roots: impl IntoIterator<Item = ParentNode<P, L>>,
        options: FlatTreeOptions,
    ) -> Self {
        let mut tree = Self {
            options,
            parents: Vec::new(),
            leaves: Vec::new(),
            roots: Vec::new(),
            entries: Vec::new(),
            id_base: 0,
            next_id: 0,
            listener: None,
            events: EventQueue::default(),
        };
        tree.setup(roots);
        tree
    }

    /// Replace the attached node set. Every root starts collapsed and
    /// handles from the previous set stop resolving. The listener is kept.
    pub fn setup(
        &mut self,
        roots: impl IntoIterator<Item = ParentNode<P, L>>,
    ) {
        self.parents.clear();
        self.leaves.clear();
        self.roots.clear();
        self.events.clear();
        self.id_base = self.next_id;

        for root in roots {
            let id = self.attach(root);
            self.roots.push(id);
        }

        self.entries = self
            .roots
            .iter()
            .map(|&id| FlatEntry::Parent {
                id,
                expanded: false,
            })
            .collect();
        debug!(
            "attached {} roots ({} parents, {} leaves)",
            self.roots.len(),
            self.parents.len(),
            self.leaves.len()
        );
    }

    fn attach(&mut self, node: ParentNode<P, L>) -> ParentId {
        let (data, depth, children) = node.into_parts();
        let id = ParentId(self.next_id);
        self.next_id += 1;
        let index = self.parents.len();
        self.parents.push(ParentSlot {
            data,
            depth,
            children: Vec::with_capacity(children.len()),
        });

        let mut refs = Vec::with_capacity(children.len());
        for child in children {
            let node = match child {
                Child::Parent(parent) => NodeRef::Parent(self.attach(parent)),
                Child::Leaf(leaf) => {
                    self.leaves.push(leaf);
                    NodeRef::Leaf(self.leaves.len() - 1)
                },
            };
            refs.push(node);
        }
        self.parents[index].children = refs;
        id
    }

    // --- Read access ---

    pub fn options(&self) -> &FlatTreeOptions {
        &self.options
    }

    /// Handles of the root parents, in construction order.
    pub fn roots(&self) -> &[ParentId] {
        &self.roots
    }

    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn item_at(&self, position: usize) -> Result<FlatItem<'_, P, L>> {
        let entry = self.entry(position)?;
        Ok(self.item(entry))
    }

    pub fn item_kind(&self, position: usize) -> Result<ItemKind> {
        Ok(match self.entry(position)? {
            FlatEntry::Parent { .. } => ItemKind::Parent,
            FlatEntry::Child(_) => ItemKind::Child,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = FlatItem<'_, P, L>> + '_ {
        self.entries.iter().map(|&entry| self.item(entry))
    }

    /// Look up an attached parent, visible or not.
    pub fn parent(&self, id: ParentId) -> Result<ParentItem<'_, P>> {
        let slot = self.slot(id)?;
        let expanded = self
            .position_of(id)
            .is_some_and(|position| self.is_expanded_at(position));
        Ok(ParentItem {
            id,
            data: &slot.data,
            depth: slot.depth,
            expanded,
            child_count: slot.children.len(),
        })
    }

    pub fn parent_data_mut(&mut self, id: ParentId) -> Result<&mut P> {
        let index = self.slot_index(id)?;
        Ok(&mut self.parents[index].data)
    }

    /// Flat position of a parent, if it is currently in the sequence.
    pub fn position_of(&self, id: ParentId) -> Option<usize> {
        self.entries.iter().position(|entry| {
            matches!(
                entry,
                FlatEntry::Parent { id: current, .. } if *current == id
            )
        })
    }

    /// Translate a flat position into the position counting only parent
    /// rows, as reported to listeners.
    pub fn logical_position(&self, position: usize) -> Result<usize> {
        self.entry(position)?;
        Ok(self.logical_position_unchecked(position))
    }

    fn logical_position_unchecked(&self, position: usize) -> usize {
        let children_before = self.entries[..position]
            .iter()
            .filter(|entry| matches!(entry, FlatEntry::Child(_)))
            .count();
        position - children_before
    }

    fn entry(&self, position: usize) -> Result<FlatEntry> {
        self.entries.get(position).copied().ok_or(Error::OutOfRange {
            position,
            len: self.entries.len(),
        })
    }

    fn item(&self, entry: FlatEntry) -> FlatItem<'_, P, L> {
        match entry {
            FlatEntry::Parent { id, expanded } => {
                let slot = &self.parents[self.index_of(id)];
                FlatItem::Parent(ParentItem {
                    id,
                    data: &slot.data,
                    depth: slot.depth,
                    expanded,
                    child_count: slot.children.len(),
                })
            },
            FlatEntry::Child(index) => FlatItem::Child(&self.leaves[index]),
        }
    }

    fn slot_index(&self, id: ParentId) -> Result<usize> {
        id.0.checked_sub(self.id_base)
            .and_then(|offset| usize::try_from(offset).ok())
            .filter(|&index| index < self.parents.len())
            .ok_or(Error::UnknownParent(id))
    }

    fn slot(&self, id: ParentId) -> Result<&ParentSlot<P>> {
        let index = self.slot_index(id)?;
        Ok(&self.parents[index])
    }

    /// Arena index of an id taken from the flat sequence. Entries only ever
    /// hold handles of the attached set.
    fn index_of(&self, id: ParentId) -> usize {
        (id.0 - self.id_base) as usize
    }

    fn is_expanded_at(&self, position: usize) -> bool {
        matches!(
            self.entries.get(position),
            Some(FlatEntry::Parent { expanded: true, .. })
        )
    }

    fn child_count(&self, id: ParentId) -> usize {
        self.parents[self.index_of(id)].children.len()
    }

    // --- Expansion ---

    /// Expand or collapse the parent at `position`.
    ///
    /// Returns an empty delta when `position` does not hold `id`, which is
    /// the usual outcome of a click dispatched against a stale row.
    pub fn toggle(&mut self, id: ParentId, position: usize) -> FlatDelta {
        let expanded = match self.entries.get(position) {
            Some(&FlatEntry::Parent {
                id: current,
                expanded,
            }) if current == id => expanded,
            _ => {
                debug!("ignoring toggle of {id} at stale position {position}");
                return FlatDelta::default();
            },
        };

        let delta = if expanded {
            self.collapse_at(position)
        } else {
            self.expand_at(position, true)
        };
        self.flush_events();
        delta
    }

    /// Toggle only when the parent is currently collapsed.
    pub fn expand_if_collapsed(
        &mut self,
        id: ParentId,
        position: usize,
    ) -> FlatDelta {
        match self.entries.get(position) {
            Some(&FlatEntry::Parent {
                id: current,
                expanded: false,
            }) if current == id => self.toggle(id, position),
            _ => FlatDelta::default(),
        }
    }

    /// Toggle only when the parent is currently expanded.
    pub fn collapse_if_expanded(
        &mut self,
        id: ParentId,
        position: usize,
    ) -> FlatDelta {
        match self.entries.get(position) {
            Some(&FlatEntry::Parent {
                id: current,
                expanded: true,
            }) if current == id => self.toggle(id, position),
            _ => FlatDelta::default(),
        }
    }

    /// Expand the first row of the sequence if it is a collapsed parent.
    pub fn expand_first(&mut self) -> FlatDelta {
        match self.entries.first() {
            Some(&FlatEntry::Parent { id, .. }) => {
                self.expand_if_collapsed(id, 0)
            },
            _ => FlatDelta::default(),
        }
    }

    /// Collapse every expanded parent, returning to the construction-time
    /// sequence.
    pub fn collapse_all(&mut self) -> FlatDelta {
        let mut delta = FlatDelta::default();
        let mut position = self.entries.len();
        while position > 0 {
            position -= 1;
            if let Some(&FlatEntry::Parent { id, expanded: true }) =
                self.entries.get(position)
            {
                delta.extend(self.collapse_if_expanded(id, position));
            }
        }
        delta
    }

    fn expand_at(&mut self, position: usize, notify: bool) -> FlatDelta {
        let mut delta = FlatDelta::default();
        let FlatEntry::Parent { id, expanded } = &mut self.entries[position]
        else {
            return delta;
        };
        *expanded = true;
        let id = *id;

        let slot = &self.parents[self.index_of(id)];
        let depth = slot.depth;
        let rows: Vec<FlatEntry> =
            slot.children.iter().copied().map(FlatEntry::from).collect();
        let start = position + 1;
        let end = start + rows.len();
        self.entries.splice(start..start, rows);
        trace!("inserted rows {start}..{end} under {id}");
        delta.push(FlatChange::Inserted(start..end));

        if notify {
            self.events.push(ExpansionEvent {
                kind: ExpansionKind::Expanded,
                parent: id,
                depth,
                logical_position: self.logical_position_unchecked(position),
            });
        }
        debug!("expanded {id} at {position} (+{})", end - start);
        delta
    }

    /// Collapse the parent at `position` together with every expanded
    /// descendant. Descendants are closed from the highest index down, so
    /// each one's children are contiguous by the time it is reached and
    /// lower indices never shift.
    fn collapse_at(&mut self, position: usize) -> FlatDelta {
        let end = self.subtree_end(position);
        let mut delta = FlatDelta::default();

        for index in (position + 1..end).rev() {
            if self.is_expanded_at(index) {
                delta.extend(self.close(index));
            }
        }
        delta.extend(self.close(position));
        delta
    }

    /// Remove the direct children of an expanded parent whose own
    /// descendants are already closed.
    fn close(&mut self, position: usize) -> FlatDelta {
        let mut delta = FlatDelta::default();
        let FlatEntry::Parent { id, expanded } = &mut self.entries[position]
        else {
            return delta;
        };
        *expanded = false;
        let id = *id;

        let start = position + 1;
        let end = (start + self.child_count(id)).min(self.entries.len());
        self.entries.drain(start..end);
        trace!("removed rows {start}..{end} under {id}");
        delta.push(FlatChange::Removed(start..end));

        self.events.push(ExpansionEvent {
            kind: ExpansionKind::Collapsed,
            parent: id,
            depth: self.parents[self.index_of(id)].depth,
            logical_position: self.logical_position_unchecked(position),
        });
        debug!("collapsed {id} at {position} (-{})", end - start);
        delta
    }

    /// One past the last row of the visible subtree rooted at `position`.
    fn subtree_end(&self, position: usize) -> usize {
        let mut end = position + 1;
        let mut remaining = self.visible_children(position);
        while remaining > 0 && end < self.entries.len() {
            remaining = remaining - 1 + self.visible_children(end);
            end += 1;
        }
        end
    }

    fn visible_children(&self, position: usize) -> usize {
        match self.entries[position] {
            FlatEntry::Parent { id, expanded: true } => self.child_count(id),
            _ => 0,
        }
    }

    // --- Persistence ---

    /// Ascending flat positions of every expanded parent.
    pub fn save(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                matches!(entry, FlatEntry::Parent { expanded: true, .. })
                    .then_some(position)
            })
            .collect()
    }

    /// Re-expand parents recorded by [`FlatTree::save`].
    ///
    /// Saved positions index the sequence as it stood at save time. The
    /// targets are sorted and walked forward through the current sequence.
    /// An expansion only inserts rows after its own row, so when the cursor
    /// reaches a target every earlier saved expansion has been replayed and
    /// both sequences agree up to that index. Targets that do not land on a
    /// collapsed parent are skipped; the walk stops at the first target past
    /// the end.
    pub fn restore(
        &mut self,
        positions: impl IntoIterator<Item = usize>,
    ) -> FlatDelta {
        let mut targets: Vec<usize> = positions.into_iter().collect();
        targets.sort_unstable();
        targets.dedup();

        let notify = self.options.notify_on_restore;
        let mut delta = FlatDelta::default();
        let mut restored = 0usize;
        let mut skipped = 0usize;

        let mut cursor = targets.into_iter();
        while let Some(target) = cursor.next() {
            match self.entries.get(target) {
                Some(FlatEntry::Parent {
                    expanded: false, ..
                }) => {
                    delta.extend(self.expand_at(target, notify));
                    restored += 1;
                },
                Some(FlatEntry::Parent { expanded: true, .. }) => {},
                Some(FlatEntry::Child(_)) => skipped += 1,
                None => {
                    skipped += 1 + cursor.len();
                    break;
                },
            }
        }

        debug!("restored {restored} expanded parents, skipped {skipped}");
        self.flush_events();
        delta
    }
}

impl<P, L> fmt::Debug for FlatTree<P, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatTree")
            .field("options", &self.options)
            .field("roots", &self.roots)
            .field("entries", &self.entries)
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}
