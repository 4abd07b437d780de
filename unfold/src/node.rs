use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable handle of a parent node attached to a [`crate::FlatTree`].
///
/// Handles are assigned from a counter owned by the tree instance, so a
/// handle obtained before [`crate::FlatTree::setup`] never resolves
/// afterwards.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ParentId(pub(crate) u64);

impl ParentId {
    /// Raw counter value behind the handle.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a flat entry as seen by the view layer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum ItemKind {
    Parent,
    Child,
}

/// Entry in a parent's child list.
#[derive(Clone, Debug, PartialEq)]
pub enum Child<P, L> {
    Parent(ParentNode<P, L>),
    Leaf(L),
}

impl<P, L> Child<P, L> {
    pub fn is_parent(&self) -> bool {
        matches!(self, Child::Parent(_))
    }
}

impl<P, L> From<ParentNode<P, L>> for Child<P, L> {
    fn from(node: ParentNode<P, L>) -> Self {
        Child::Parent(node)
    }
}

/// Expandable tree node built by the caller before it is attached.
///
/// `depth` is an opaque key owned by the caller. The engine never reads it;
/// only policies such as [`crate::SingleExpandedSibling`] compare it.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentNode<P, L> {
    data: P,
    depth: usize,
    children: Vec<Child<P, L>>,
}

impl<P, L> ParentNode<P, L> {
    pub fn new(data: P, depth: usize) -> Self {
        Self {
            data,
            depth,
            children: Vec::new(),
        }
    }

    /// Append a leaf and return the node.
    pub fn with_leaf(mut self, leaf: L) -> Self {
        self.push_leaf(leaf);
        self
    }

    /// Append a nested parent and return the node.
    pub fn with_parent(mut self, parent: ParentNode<P, L>) -> Self {
        self.push_parent(parent);
        self
    }

    /// Append every child from `children`, keeping their order.
    pub fn with_children(
        mut self,
        children: impl IntoIterator<Item = Child<P, L>>,
    ) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push_leaf(&mut self, leaf: L) {
        self.children.push(Child::Leaf(leaf));
    }

    pub fn push_parent(&mut self, parent: ParentNode<P, L>) {
        self.children.push(Child::Parent(parent));
    }

    pub fn data(&self) -> &P {
        &self.data
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[Child<P, L>] {
        &self.children
    }

    pub(crate) fn into_parts(self) -> (P, usize, Vec<Child<P, L>>) {
        (self.data, self.depth, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_builder_calls_when_node_built_then_children_keep_order() {
        let node = ParentNode::new("root", 1)
            .with_leaf("a")
            .with_parent(ParentNode::new("nested", 2).with_leaf("b"))
            .with_children([Child::Leaf("c")]);

        assert_eq!(node.data(), &"root");
        assert_eq!(node.depth(), 1);
        assert_eq!(node.children().len(), 3);
        assert!(matches!(node.children()[0], Child::Leaf("a")));
        assert!(node.children()[1].is_parent());
        assert!(matches!(node.children()[2], Child::Leaf("c")));
    }

    #[test]
    fn given_parent_id_when_formatted_then_uses_hash_prefix() {
        assert_eq!(ParentId(7).to_string(), "#7");
        assert_eq!(ParentId(7).get(), 7);
    }

    #[test]
    fn given_item_kind_when_serialized_then_uses_variant_name() {
        let json = serde_json::to_string(&ItemKind::Parent)
            .expect("should serialize");
        assert_eq!(json, "\"Parent\"");
    }
}
