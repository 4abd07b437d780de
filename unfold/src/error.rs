use thiserror::Error;

use crate::node::ParentId;

/// Errors returned by [`crate::FlatTree`] lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("position {position} is out of range for {len} flat entries")]
    OutOfRange { position: usize, len: usize },

    #[error("parent {0} does not belong to the attached node set")]
    UnknownParent(ParentId),
}

pub type Result<T> = std::result::Result<T, Error>;
