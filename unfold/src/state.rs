//! Saving and restoring expansion state through a key-value bag.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::delta::FlatDelta;
use crate::tree::FlatTree;

/// Errors produced while reading or writing a [`JsonStateBag`] file.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Host-provided container for persisted integer lists.
pub trait StateBag {
    fn put(&mut self, key: &str, values: Vec<i64>);
    fn get(&self, key: &str) -> Option<Vec<i64>>;
}

impl StateBag for HashMap<String, Vec<i64>> {
    fn put(&mut self, key: &str, values: Vec<i64>) {
        self.insert(key.to_owned(), values);
    }

    fn get(&self, key: &str) -> Option<Vec<i64>> {
        HashMap::get(self, key).cloned()
    }
}

impl StateBag for BTreeMap<String, Vec<i64>> {
    fn put(&mut self, key: &str, values: Vec<i64>) {
        self.insert(key.to_owned(), values);
    }

    fn get(&self, key: &str) -> Option<Vec<i64>> {
        BTreeMap::get(self, key).cloned()
    }
}

/// State bag backed by a JSON object.
///
/// Values that are not arrays of integers read back as missing, so a
/// hand-edited or truncated file never aborts a restore.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonStateBag {
    values: BTreeMap<String, Value>,
}

impl JsonStateBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_string(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a bag from disk. A missing file yields an empty bag.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            },
            Err(err) => return Err(err.into()),
        };
        Self::from_json_str(&content)
    }

    /// Save the bag to disk atomically.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let payload = self.to_json_string()?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload.as_bytes())?;
        std::fs::rename(tmp_path, path)?;
        Ok(())
    }
}

impl StateBag for JsonStateBag {
    fn put(&mut self, key: &str, values: Vec<i64>) {
        self.values.insert(key.to_owned(), Value::from(values));
    }

    fn get(&self, key: &str) -> Option<Vec<i64>> {
        let Value::Array(items) = self.values.get(key)? else {
            log::warn!("state entry {key:?} is not an array, ignoring it");
            return None;
        };
        let values: Option<Vec<i64>> =
            items.iter().map(Value::as_i64).collect();
        if values.is_none() {
            log::warn!(
                "state entry {key:?} holds non-integer values, ignoring it"
            );
        }
        values
    }
}

impl<P, L> FlatTree<P, L> {
    /// Store [`FlatTree::save`] under the configured state key.
    pub fn save_state(&self, bag: &mut impl StateBag) {
        let positions = self
            .save()
            .into_iter()
            .filter_map(|position| i64::try_from(position).ok())
            .collect();
        bag.put(&self.options().state_key, positions);
    }

    /// Restore from the configured state key. A missing or malformed entry
    /// restores nothing.
    pub fn restore_state(&mut self, bag: &impl StateBag) -> FlatDelta {
        let key = &self.options().state_key;
        let Some(values) = bag.get(key) else {
            log::debug!("no saved expansion state under {key:?}");
            return FlatDelta::default();
        };

        let total = values.len();
        let positions: Vec<usize> = values
            .into_iter()
            .filter_map(|value| usize::try_from(value).ok())
            .collect();
        if positions.len() != total {
            log::warn!(
                "dropped {} negative positions from saved state",
                total - positions.len()
            );
        }
        self.restore(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ParentNode;
    use crate::options::{DEFAULT_STATE_KEY, FlatTreeOptions};

    type Tree = FlatTree<&'static str, &'static str>;

    fn roots() -> Vec<ParentNode<&'static str, &'static str>> {
        vec![
            ParentNode::new("A", 1)
                .with_leaf("A1")
                .with_parent(
                    ParentNode::new("A2", 2).with_leaf("A2a").with_leaf("A2b"),
                )
                .with_leaf("A3"),
            ParentNode::new("B", 1).with_leaf("B1"),
        ]
    }

    fn expanded_tree() -> Tree {
        let mut tree = Tree::new(roots());
        let a = tree.roots()[0];
        tree.toggle(a, 0);
        let a2 = tree
            .item_at(2)
            .expect("A2 row")
            .as_parent()
            .expect("parent")
            .id;
        tree.toggle(a2, 2);
        tree
    }

    #[test]
    fn given_expanded_tree_when_saved_to_map_then_default_key_holds_positions()
    {
        let tree = expanded_tree();
        let mut bag: HashMap<String, Vec<i64>> = HashMap::new();

        tree.save_state(&mut bag);

        assert_eq!(bag.get(DEFAULT_STATE_KEY), Some(&vec![0, 2]));
    }

    #[test]
    fn given_saved_bag_when_restored_on_fresh_tree_then_seven_rows_return() {
        let mut bag: HashMap<String, Vec<i64>> = HashMap::new();
        expanded_tree().save_state(&mut bag);

        let mut fresh = Tree::new(roots());
        fresh.restore_state(&bag);

        assert_eq!(fresh.item_count(), 7);
        assert_eq!(fresh.save(), vec![0, 2]);
    }

    #[test]
    fn given_missing_key_when_restored_then_nothing_expands() {
        let mut tree = Tree::new(roots());
        let bag: BTreeMap<String, Vec<i64>> = BTreeMap::new();

        assert!(tree.restore_state(&bag).is_empty());
        assert_eq!(tree.item_count(), 2);
    }

    #[test]
    fn given_negative_positions_when_restored_then_they_are_skipped() {
        let mut tree = Tree::new(roots());
        let mut bag: HashMap<String, Vec<i64>> = HashMap::new();
        bag.put(DEFAULT_STATE_KEY, vec![-3, 1]);

        tree.restore_state(&bag);

        assert_eq!(tree.save(), vec![1]);
    }

    #[test]
    fn given_custom_key_when_saved_then_bag_uses_it() {
        let options = FlatTreeOptions {
            state_key: String::from("sidebar"),
            ..FlatTreeOptions::default()
        };
        let mut tree = Tree::with_options(roots(), options);
        tree.expand_first();
        let mut bag = JsonStateBag::new();

        tree.save_state(&mut bag);

        assert_eq!(bag.get("sidebar"), Some(vec![0]));
        assert_eq!(bag.get(DEFAULT_STATE_KEY), None);
    }

    #[test]
    fn given_json_bag_when_serialized_then_round_trips() {
        let mut bag = JsonStateBag::new();
        bag.put(DEFAULT_STATE_KEY, vec![0, 2]);

        let json = bag.to_json_string().expect("should serialize");
        let parsed = JsonStateBag::from_json_str(&json).expect("should parse");

        assert_eq!(parsed.get(DEFAULT_STATE_KEY), Some(vec![0, 2]));
    }

    #[test]
    fn given_malformed_json_entries_when_read_then_treated_as_missing() {
        let bag = JsonStateBag::from_json_str(
            r#"{ "a": "oops", "b": [0, "x"], "c": [1, 4] }"#,
        )
        .expect("valid json object");

        assert_eq!(bag.get("a"), None);
        assert_eq!(bag.get("b"), None);
        assert_eq!(bag.get("c"), Some(vec![1, 4]));
    }

    #[test]
    fn given_missing_file_when_loaded_then_bag_is_empty() {
        let path = std::env::temp_dir()
            .join("unfold-state-tests")
            .join("does-not-exist.json");

        let bag = JsonStateBag::load(&path).expect("missing file is fine");

        assert_eq!(bag, JsonStateBag::default());
    }

    #[test]
    fn given_bag_when_saved_to_disk_then_load_returns_same_values() {
        let path = std::env::temp_dir()
            .join(format!("unfold-state-{}", std::process::id()))
            .join("state.json");
        let mut bag = JsonStateBag::new();
        bag.put(DEFAULT_STATE_KEY, vec![0, 6]);

        bag.save(&path).expect("should save");
        let loaded = JsonStateBag::load(&path).expect("should load");
        let _ = std::fs::remove_dir_all(path.parent().expect("has parent"));

        assert_eq!(loaded, bag);
    }
}
