//! Reasons an operation had no effect.

use thiserror::Error;

/// The reason a graph mutation did not take effect.
///
/// None of these are failures of the replica: they are ordinary outcomes of
/// last-writer-wins conflict resolution. Timestamps are still recorded when
/// an operation is rejected as superseded, so that later merges resolve the
/// same way on every replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum Rejection {
    /// An edge was requested from a vertex to itself.
    #[error("edge endpoints are the same vertex")]
    SelfLoop,

    /// A removal at an equal or later timestamp dominates the addition.
    #[error("addition is superseded by a removal at an equal or later timestamp")]
    AddSuperseded,

    /// An addition at a later timestamp dominates the removal.
    #[error("removal is superseded by an addition at a later timestamp")]
    RemoveSuperseded,

    /// An endpoint of the edge is removed at or after the edge's timestamp.
    #[error("an edge endpoint is removed at or after the edge timestamp")]
    EndpointRemoved,
}
