//! Flattening engine that projects an expandable tree onto a flat list.
//!
//! Virtualized list views want a single sequence they can index at random.
//! [`FlatTree`] keeps that sequence for a tree of [`ParentNode`]s and edits
//! it in place as parents are expanded and collapsed:
//! - expanding inserts one row per direct child right after the parent;
//! - collapsing removes the parent's whole visible subtree, nested expanded
//!   parents included;
//! - every call reports the runs it inserted or removed as a [`FlatDelta`]
//!   so the view can update incrementally.
//!
//! Hosts can observe changes with a listener (see [`FlatTree::set_listener`]),
//! enforce one expanded parent per depth with [`SingleExpandedSibling`], and
//! persist expansion state through any [`StateBag`].
//!
//! # Quick Example
//!
//! ```
//! use unfold::{FlatChange, FlatTree, ParentNode};
//!
//! let mut tree = FlatTree::new([
//!     ParentNode::new("Category 1", 1)
//!         .with_leaf("Item 1")
//!         .with_parent(
//!             ParentNode::new("Sub-Category 1", 2).with_leaf("Item 2"),
//!         ),
//!     ParentNode::new("Category 2", 1).with_leaf("Item 3"),
//! ]);
//!
//! let first = tree.roots()[0];
//! let delta = tree.toggle(first, 0);
//! assert_eq!(delta.changes(), [FlatChange::Inserted(1..3)]);
//! assert_eq!(tree.item_count(), 4);
//!
//! let saved = tree.save();
//! let delta = tree.toggle(first, 0);
//! assert_eq!(delta.changes(), [FlatChange::Removed(1..3)]);
//!
//! tree.restore(saved);
//! assert_eq!(tree.item_count(), 4);
//! ```

mod delta;
mod error;
mod event;
mod exclusive;
mod node;
mod options;
mod state;
mod tree;

pub use delta::{FlatChange, FlatDelta};
pub use error::{Error, Result};
pub use event::{ExpansionEvent, ExpansionKind, Listener};
pub use exclusive::{SingleExpandedSibling, collapse_depth};
pub use node::{Child, ItemKind, ParentId, ParentNode};
pub use options::{DEFAULT_STATE_KEY, FlatTreeOptions};
pub use state::{JsonStateBag, StateBag, StateError};
pub use tree::{FlatItem, FlatTree, ParentItem};
