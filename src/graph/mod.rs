//! Graph CRDTs.
//!
//! ###### `LwwGraph`
//!
//! An undirected graph built from two [`TimestampedElementSet`]s, one of
//! vertices and one of edges, so every vertex and edge follows
//! last-writer-wins semantics on its own. The graph additionally keeps an
//! adjacency index derived from the two sets, which answers neighbour and
//! path queries without scanning the sets.
//!
//! The sets decide the graph; the index only reflects them. An edge appears
//! in the index while it is in the edge set, both its endpoints are in the
//! vertex set, and it was added after the latest removal of either endpoint.
//! Removing a vertex therefore retracts every edge added before the removal,
//! whichever order the two operations reach a replica in.
//!
//! [`TimestampedElementSet`]: crate::set::TimestampedElementSet

pub use self::element::{GraphEdge, GraphVertex};
pub use self::lwwgraph::{GraphOp, LwwGraph};

use crate::Crdt;

mod element;
mod lwwgraph;
mod search;

/// The operations every replicated graph supports.
///
/// Mutations take the timestamp of the operation and return the affected
/// vertex or edge, or `None` when the operation was superseded or invalid.
/// Queries never fail: unknown vertices have no neighbours and no paths.
/// Replicas are merged through [`Crdt::merge`].
pub trait Graph: Crdt {

    /// The value wrapped by each vertex.
    type Value;

    /// The timestamp attached to every mutation.
    type Timestamp;

    /// Add a vertex.
    fn add_vertex(&mut self,
                  vertex: GraphVertex<Self::Value>,
                  timestamp: Self::Timestamp)
                  -> Option<GraphVertex<Self::Value>>;

    /// Remove a vertex and retract the edges touching it.
    fn remove_vertex(&mut self,
                     vertex: GraphVertex<Self::Value>,
                     timestamp: Self::Timestamp)
                     -> Option<GraphVertex<Self::Value>>;

    /// Add an edge between two distinct vertices, adding the vertices as
    /// needed.
    fn add_edge(&mut self,
                from: GraphVertex<Self::Value>,
                to: GraphVertex<Self::Value>,
                timestamp: Self::Timestamp)
                -> Option<GraphEdge<Self::Value>>;

    /// Remove an edge.
    fn remove_edge(&mut self,
                   edge: GraphEdge<Self::Value>,
                   timestamp: Self::Timestamp)
                   -> Option<GraphEdge<Self::Value>>;

    /// Returns true if the vertex is in the graph.
    fn lookup(&self, vertex: &GraphVertex<Self::Value>) -> bool;

    /// The neighbours of a vertex.
    fn vertices_connected(&self, vertex: &GraphVertex<Self::Value>) -> Vec<GraphVertex<Self::Value>>;

    /// A path with the fewest edges between two vertices, both included.
    fn find_path(&self,
                 from: &GraphVertex<Self::Value>,
                 to: &GraphVertex<Self::Value>)
                 -> Vec<GraphVertex<Self::Value>>;
}
