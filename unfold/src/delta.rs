//! Incremental change reports for the view layer.
//!
//! Every mutating [`crate::FlatTree`] call returns a [`FlatDelta`]. Changes
//! are listed in the order they were applied, so replaying them one by one
//! against a mirror of the previous sequence yields the current one.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One contiguous edit of the flat sequence.
///
/// Ranges are half-open and expressed in the coordinates of the sequence
/// right before the edit (for removals) or right after it (for insertions).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlatChange {
    Inserted(Range<usize>),
    Removed(Range<usize>),
}

impl FlatChange {
    pub fn range(&self) -> &Range<usize> {
        match self {
            FlatChange::Inserted(range) | FlatChange::Removed(range) => range,
        }
    }

    /// Signed change in sequence length.
    pub fn len_delta(&self) -> isize {
        match self {
            FlatChange::Inserted(range) => range.len() as isize,
            FlatChange::Removed(range) => -(range.len() as isize),
        }
    }
}

/// Ordered list of edits produced by a single engine call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatDelta {
    changes: Vec<FlatChange>,
}

impl FlatDelta {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[FlatChange] {
        &self.changes
    }

    /// Ranges that were inserted, in application order.
    pub fn inserted(&self) -> impl Iterator<Item = &Range<usize>> {
        self.changes.iter().filter_map(|change| match change {
            FlatChange::Inserted(range) => Some(range),
            FlatChange::Removed(_) => None,
        })
    }

    /// Ranges that were removed, in application order.
    pub fn removed(&self) -> impl Iterator<Item = &Range<usize>> {
        self.changes.iter().filter_map(|change| match change {
            FlatChange::Removed(range) => Some(range),
            FlatChange::Inserted(_) => None,
        })
    }

    /// Net change in sequence length.
    pub fn len_delta(&self) -> isize {
        self.changes.iter().map(FlatChange::len_delta).sum()
    }

    pub(crate) fn push(&mut self, change: FlatChange) {
        // Empty runs carry nothing for the view to apply.
        if change.range().is_empty() {
            return;
        }
        self.changes.push(change);
    }

    pub(crate) fn extend(&mut self, other: FlatDelta) {
        self.changes.extend(other.changes);
    }
}

impl IntoIterator for FlatDelta {
    type Item = FlatChange;
    type IntoIter = std::vec::IntoIter<FlatChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_range_when_pushed_then_delta_stays_empty() {
        let mut delta = FlatDelta::default();
        delta.push(FlatChange::Inserted(3..3));
        assert!(delta.is_empty());
    }

    #[test]
    fn given_mixed_changes_when_summed_then_len_delta_is_net() {
        let mut delta = FlatDelta::default();
        delta.push(FlatChange::Removed(3..5));
        delta.push(FlatChange::Removed(1..3));
        delta.push(FlatChange::Inserted(1..2));

        assert_eq!(delta.len_delta(), -3);
        assert_eq!(delta.removed().cloned().collect::<Vec<_>>(), [3..5, 1..3]);
        assert_eq!(delta.inserted().cloned().collect::<Vec<_>>(), [1..2]);
    }
}
