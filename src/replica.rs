//! A graph paired with a clock.
//!
//! [`LwwGraph`] takes the timestamp of every mutation from its caller. A
//! `Replica` reads the timestamp from its [`Clock`] instead, and feeds the
//! timestamps of merged replicas back into the clock.

use std::hash::Hash;

use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::graph::{Graph, GraphEdge, GraphVertex, LwwGraph};
use crate::Crdt;

/// A local replica of an [`LwwGraph`] with `u64` timestamps.
///
/// ##### Example
///
/// ```
/// use lwwgraph::clock::LamportClock;
/// use lwwgraph::graph::{Graph, GraphVertex};
/// use lwwgraph::replica::Replica;
///
/// let (a, b) = (GraphVertex::new("a"), GraphVertex::new("b"));
/// let mut replica = Replica::new(LamportClock::new());
/// replica.add_edge(a, b);
/// replica.remove_vertex(b);
///
/// assert!(replica.graph().lookup(&a));
/// assert!(!replica.graph().lookup(&b));
/// ```
#[derive(Clone, Debug)]
pub struct Replica<T, C = SystemClock> where T: Eq + Hash {
    graph: LwwGraph<T>,
    clock: C,
}

impl <T, C> Replica<T, C> where T: Clone + Eq + Hash, C: Clock {

    /// Create a replica of an empty graph.
    pub fn new(clock: C) -> Replica<T, C> {
        Replica { graph: LwwGraph::new(), clock }
    }

    /// Create a replica of an existing graph. The clock is moved past every
    /// timestamp already in the graph.
    pub fn from_graph(graph: LwwGraph<T>, mut clock: C) -> Replica<T, C> {
        if let Some(latest) = graph.latest_timestamp() {
            clock.observe(latest);
        }
        Replica { graph, clock }
    }

    pub fn graph(&self) -> &LwwGraph<T> {
        &self.graph
    }

    /// The graph, for operations carrying their own timestamps.
    pub fn graph_mut(&mut self) -> &mut LwwGraph<T> {
        &mut self.graph
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn into_graph(self) -> LwwGraph<T> {
        self.graph
    }

    /// Reads the clock, advancing it.
    pub fn now(&mut self) -> u64 {
        self.clock.now()
    }

    pub fn add_vertex(&mut self, vertex: GraphVertex<T>) -> Option<GraphVertex<T>> {
        let timestamp = self.clock.now();
        self.graph.add_vertex(vertex, timestamp)
    }

    pub fn remove_vertex(&mut self, vertex: GraphVertex<T>) -> Option<GraphVertex<T>> {
        let timestamp = self.clock.now();
        self.graph.remove_vertex(vertex, timestamp)
    }

    pub fn add_edge(&mut self, from: GraphVertex<T>, to: GraphVertex<T>) -> Option<GraphEdge<T>> {
        let timestamp = self.clock.now();
        self.graph.add_edge(from, to, timestamp)
    }

    pub fn remove_edge(&mut self, edge: GraphEdge<T>) -> Option<GraphEdge<T>> {
        let timestamp = self.clock.now();
        self.graph.remove_edge(edge, timestamp)
    }

    /// Merge a remote graph into this replica.
    pub fn merge(&mut self, other: LwwGraph<T>) {
        if let Some(latest) = other.latest_timestamp() {
            trace!(latest, "observed remote timestamp");
            self.clock.observe(latest);
        }
        self.graph.merge(other);
    }
}

impl <T> Default for Replica<T> where T: Clone + Eq + Hash {
    fn default() -> Replica<T> {
        Replica::new(SystemClock::new())
    }
}
