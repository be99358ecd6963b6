use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that abort building a tree.
///
/// Vertices with non-finite coordinates are not errors; they are skipped.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Growing the branch arena or the insertion queue failed. The tree may
    /// hold a partial update and should be discarded.
    #[error("failed to allocate tree storage: {0}")]
    Allocation(#[from] TryReserveError),

    /// The vertex to insert does not exist in the given slice.
    #[error("vertex index {index} out of range for {len} vertices")]
    VertexOutOfRange { index: usize, len: usize },
}
