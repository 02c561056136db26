use thiserror::Error;

/// Errors reported by [`BstMap`](crate::BstMap) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `erase` was asked to remove a key that is not in the map. The map is unchanged.
    #[error("the given key does not exist")]
    KeyNotFound,

    /// `check_invariants` found the node graph in a state no public operation can produce.
    #[error("tree structure is corrupted: {0}")]
    Corrupted(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
