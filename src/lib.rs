//! Last-writer-wins set and graph CRDTs.
//!
//! The building block is [`TimestampedElementSet`](set::TimestampedElementSet),
//! a state-based LWW-Set which keeps the latest add and the latest remove
//! timestamp of every element it has ever seen. [`LwwGraph`](graph::LwwGraph)
//! composes two of them, one for vertices and one for edges, and keeps a
//! derived adjacency index for neighbour queries and path search.
//!
//! Timestamps are always supplied by the caller. The core never reads a
//! clock; [`Replica`](replica::Replica) pairs a graph with a
//! [`Clock`](clock::Clock) for callers that want "now" filled in for them.
//!
//! ###### Further Reading
//!
//! 1. [_A comprehensive study of Convergent and Commutative Replicated Data Types_](http://hal.inria.fr/docs/00/55/55/88/PDF/techreport.pdf) (Shapiro, et al.)
//! 2. [_Conflict-free Replicated Data Types_](https://hal.inria.fr/inria-00609399/document) (Shapiro, et al.)

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub mod clock;
pub mod error;
pub mod graph;
pub mod replica;
pub mod set;

#[cfg(test)]
mod test;

pub use error::Rejection;
pub use graph::{Graph, GraphEdge, GraphOp, GraphVertex, LwwGraph};
pub use set::{SetOp, TimestampedElementSet};

/// A Conflict-free Replicated Data Type.
///
/// Conflict-free replicated data types (also called convergent and commutative
/// replicated data types) allow for concurrent updates to distributed replicas
/// with strong eventual consistency and without coordination.
///
/// ###### Replication
///
/// Updates to CRDTs can be shared with replicas in two ways: state-based
/// replication and operation-based replication. With state-based replication,
/// the entire state of the mutated CRDT is merged into remote replicas in order
/// to restore consistency. With operation-based replication, only the mutating
/// operation is applied to remote replicas. Every operation in this crate
/// carries its own timestamp, so operations may be applied in any order and
/// any number of times.
///
/// ###### Equality
///
/// Equality among replicas is equality of their observable state. Two
/// replicas which have seen the same operations compare equal, regardless of
/// the order in which the operations were applied or merged.
pub trait Crdt: Clone + Eq {

    type Operation: Clone;

    /// Merge a replica into this CRDT.
    ///
    /// This method is used to perform state-based replication. Merging is
    /// commutative, associative and idempotent.
    fn merge(&mut self, other: Self);

    /// Apply an operation to this CRDT.
    ///
    /// This method is used to perform operation-based replication.
    fn apply(&mut self, operation: Self::Operation);

    /// Returns the merge of this CRDT and a replica, leaving both untouched.
    fn merging(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge(other.clone());
        merged
    }
}
