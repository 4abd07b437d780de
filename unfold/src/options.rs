/// Default key under which expanded positions are stored in a
/// [`crate::StateBag`].
pub const DEFAULT_STATE_KEY: &str = "unfold.expanded_positions";

/// Configuration knobs that influence how a [`crate::FlatTree`] behaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatTreeOptions {
    /// Key used by `save_state` / `restore_state`.
    pub state_key: String,
    /// Fire `Expanded` events for parents re-expanded by `restore`.
    pub notify_on_restore: bool,
}

impl Default for FlatTreeOptions {
    fn default() -> Self {
        Self {
            state_key: String::from(DEFAULT_STATE_KEY),
            notify_on_restore: false,
        }
    }
}
