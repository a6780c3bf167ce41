use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::Hash;

#[cfg(any(test, feature = "quickcheck_generators"))]
use quickcheck::{Arbitrary, Gen};
#[cfg(feature = "serde")]
use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, instrument, trace};

use crate::error::Rejection;
use crate::set::TimestampedElementSet;
use crate::Crdt;
use super::search::{self, Adjacency};
use super::{Graph, GraphEdge, GraphVertex};

/// A last-writer-wins graph.
///
/// Vertices and edges each live in their own [`TimestampedElementSet`]. The
/// adjacency index holds one entry per vertex in the graph, listing the live
/// edges leaving it; an edge between `a` and `b` is listed under `a` as
/// `a -> b` and under `b` as `b -> a`.
#[derive(Clone)]
pub struct LwwGraph<T, Ts = u64> where T: Eq + Hash {
    vertices: TimestampedElementSet<GraphVertex<T>, Ts>,
    edges: TimestampedElementSet<GraphEdge<T>, Ts>,
    adjacency: Adjacency<T>,
}

/// A mutation of an `LwwGraph`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GraphOp<T, Ts = u64> {
    AddVertex(GraphVertex<T>, Ts),
    RemoveVertex(GraphVertex<T>, Ts),
    AddEdge(GraphVertex<T>, GraphVertex<T>, Ts),
    RemoveEdge(GraphEdge<T>, Ts),
}

fn rejected<V>(operation: &'static str, rejection: Rejection) -> Result<V, Rejection> {
    trace!(operation, %rejection, "graph operation had no effect");
    Err(rejection)
}

/// Lists `edge` under its source and its inverse under its target, skipping
/// vertices without an entry and edges already listed.
fn link<T>(adjacency: &mut Adjacency<T>, edge: GraphEdge<T>) where T: Clone + Eq + Hash {
    let inverse = edge.inverted();
    for edge in [edge, inverse] {
        if let Some(edges) = adjacency.get_mut(edge.from()) {
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }
}

fn unlink<T>(adjacency: &mut Adjacency<T>, edge: &GraphEdge<T>) where T: Eq + Hash {
    if let Some(edges) = adjacency.get_mut(edge.from()) {
        edges.retain(|e| e.to() != edge.to());
    }
    if let Some(edges) = adjacency.get_mut(edge.to()) {
        edges.retain(|e| e.to() != edge.from());
    }
}

impl <T, Ts> LwwGraph<T, Ts> where T: Eq + Hash {

    /// Create a new, empty last-writer-wins graph.
    ///
    /// ### Example
    ///
    /// ```
    /// use lwwgraph::graph::LwwGraph;
    ///
    /// let graph = LwwGraph::<&str>::new();
    /// assert!(graph.is_empty());
    /// ```
    pub fn new() -> LwwGraph<T, Ts> {
        LwwGraph {
            vertices: TimestampedElementSet::new(),
            edges: TimestampedElementSet::new(),
            adjacency: HashMap::new(),
        }
    }

    /// The number of vertices in the graph.
    pub fn count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// The set of vertices, including removed ones.
    pub fn vertex_set(&self) -> &TimestampedElementSet<GraphVertex<T>, Ts> {
        &self.vertices
    }

    /// The set of edges, including removed ones.
    pub fn edge_set(&self) -> &TimestampedElementSet<GraphEdge<T>, Ts> {
        &self.edges
    }

    pub fn into_sets(self) -> (TimestampedElementSet<GraphVertex<T>, Ts>, TimestampedElementSet<GraphEdge<T>, Ts>) {
        (self.vertices, self.edges)
    }

    /// Each vertex with the edges leaving it.
    pub fn links(&self) -> impl Iterator<Item = (&GraphVertex<T>, &[GraphEdge<T>])> + '_ {
        self.adjacency.iter().map(|(vertex, edges)| (vertex, edges.as_slice()))
    }
}

impl <T, Ts> LwwGraph<T, Ts> where T: Clone + Eq + Hash, Ts: Ord + Copy {

    /// Build a graph from a vertex set and an edge set, such as the sets of a
    /// remote replica.
    pub fn from_sets(vertices: TimestampedElementSet<GraphVertex<T>, Ts>,
                     edges: TimestampedElementSet<GraphEdge<T>, Ts>)
                     -> LwwGraph<T, Ts> {
        let mut graph = LwwGraph { vertices, edges, adjacency: HashMap::new() };
        graph.rebuild();
        graph
    }

    /// Add a vertex at `timestamp`.
    ///
    /// Fails with [`Rejection::AddSuperseded`] if the vertex was removed at
    /// the same or a later timestamp.
    pub fn try_add_vertex(&mut self, vertex: GraphVertex<T>, timestamp: Ts) -> Result<GraphVertex<T>, Rejection> {
        match self.vertices.add(vertex, timestamp) {
            Some(vertex) => {
                self.refresh_vertex(&vertex);
                Ok(vertex)
            },
            None => rejected("add_vertex", Rejection::AddSuperseded),
        }
    }

    /// Remove a vertex at `timestamp`.
    ///
    /// Every edge touching the vertex which was added at or before
    /// `timestamp` is removed along with it, in both orientations. This
    /// happens even when the vertex itself stays in the graph because it was
    /// added again later: those edges belong to the part of the history the
    /// removal covers.
    ///
    /// Fails with [`Rejection::RemoveSuperseded`] if the vertex was added at a
    /// later timestamp.
    ///
    /// ##### Example
    ///
    /// ```
    /// use lwwgraph::graph::{Graph, GraphVertex, LwwGraph};
    ///
    /// let (a, b) = (GraphVertex::new('a'), GraphVertex::new('b'));
    /// let mut graph = LwwGraph::new();
    /// graph.add_edge(a, b, 1);
    /// graph.add_vertex(a, 10);
    ///
    /// assert!(graph.try_remove_vertex(a, 5).is_err());
    /// assert!(graph.lookup(&a));
    /// assert!(graph.vertices_connected(&a).is_empty());
    /// ```
    pub fn try_remove_vertex(&mut self, vertex: GraphVertex<T>, timestamp: Ts) -> Result<GraphVertex<T>, Rejection> {
        let removed = self.vertices.remove(vertex.clone(), timestamp);

        let incident = self.adjacency.get(&vertex).cloned().unwrap_or_default();
        let mut retracted = 0usize;
        for edge in &incident {
            for identity in [edge.clone(), edge.inverted()] {
                if self.edges.added_at(&identity).map_or(false, |added| added <= timestamp) {
                    self.edges.remove(identity, timestamp);
                    retracted += 1;
                }
            }
            self.refresh_link(edge.from(), edge.to());
        }
        self.refresh_vertex(&vertex);

        if retracted > 0 {
            debug!(retracted, present = self.lookup(&vertex), "vertex removal retracted incident edges");
        }
        match removed {
            Some(vertex) => Ok(vertex),
            None => rejected("remove_vertex", Rejection::RemoveSuperseded),
        }
    }

    /// Add an edge from `from` to `to` at `timestamp`.
    ///
    /// Both endpoints are added at `timestamp` as well, which creates them if
    /// they are new. Fails with [`Rejection::SelfLoop`] without touching the
    /// graph if the endpoints are equal, with [`Rejection::EndpointRemoved`]
    /// if either endpoint was removed at the same or a later timestamp, and
    /// with [`Rejection::AddSuperseded`] if the edge itself was.
    ///
    /// ##### Example
    ///
    /// ```
    /// use lwwgraph::graph::{Graph, GraphVertex, LwwGraph};
    /// use lwwgraph::Rejection;
    ///
    /// let (a, b) = (GraphVertex::new(1), GraphVertex::new(2));
    /// let mut graph = LwwGraph::new();
    ///
    /// assert!(graph.try_add_edge(a, b, 1).is_ok());
    /// assert_eq!(vec![b], graph.vertices_connected(&a));
    /// assert_eq!(Err(Rejection::SelfLoop), graph.try_add_edge(a, a, 2));
    /// ```
    pub fn try_add_edge(&mut self, from: GraphVertex<T>, to: GraphVertex<T>, timestamp: Ts) -> Result<GraphEdge<T>, Rejection> {
        if from == to {
            return rejected("add_edge", Rejection::SelfLoop);
        }

        let from_added = self.vertices.add(from.clone(), timestamp).is_some();
        let to_added = self.vertices.add(to.clone(), timestamp).is_some();
        self.refresh_vertex(&from);
        self.refresh_vertex(&to);
        if !(from_added && to_added) {
            return rejected("add_edge", Rejection::EndpointRemoved);
        }

        let edge = GraphEdge::new(from, to);
        let added = self.edges.add(edge.clone(), timestamp);
        self.refresh_link(edge.from(), edge.to());
        match added {
            Some(edge) => Ok(edge),
            None => rejected("add_edge", Rejection::AddSuperseded),
        }
    }

    /// Remove an edge at `timestamp`.
    ///
    /// Both orientations of the edge are removed, so the edge disappears from
    /// the neighbours of both endpoints whichever orientation it was added
    /// or listed in.
    ///
    /// Fails with [`Rejection::RemoveSuperseded`] if either orientation was
    /// added at a later timestamp, in which case the endpoints stay
    /// connected.
    ///
    /// ##### Example
    ///
    /// ```
    /// use lwwgraph::graph::{Graph, GraphEdge, GraphVertex, LwwGraph};
    ///
    /// let (a, b) = (GraphVertex::new('a'), GraphVertex::new('b'));
    /// let mut graph = LwwGraph::new();
    /// graph.add_edge(a, b, 1);
    ///
    /// assert!(graph.try_remove_edge(GraphEdge::new(b, a), 2).is_ok());
    /// assert!(graph.vertices_connected(&a).is_empty());
    /// assert!(graph.vertices_connected(&b).is_empty());
    /// ```
    pub fn try_remove_edge(&mut self, edge: GraphEdge<T>, timestamp: Ts) -> Result<GraphEdge<T>, Rejection> {
        if edge.is_self_loop() {
            return rejected("remove_edge", Rejection::SelfLoop);
        }

        let inverse_removed = self.edges.remove(edge.inverted(), timestamp).is_some();
        let removed = self.edges.remove(edge.clone(), timestamp);
        self.refresh_link(edge.from(), edge.to());
        match removed {
            Some(edge) if inverse_removed => Ok(edge),
            _ => rejected("remove_edge", Rejection::RemoveSuperseded),
        }
    }

    /// Returns true if the vertex was in the graph as of `timestamp`.
    pub fn lookup_at(&self, vertex: &GraphVertex<T>, timestamp: Ts) -> bool {
        self.vertices.contains_at(vertex, timestamp)
    }

    /// The vertices currently in the graph.
    pub fn vertices(&self) -> HashSet<GraphVertex<T>> {
        self.adjacency.keys().cloned().collect()
    }

    /// Hop counts from `from` to every vertex reachable from it, including
    /// `from` itself at distance 0. Empty if `from` is not in the graph.
    pub fn connected_vertices_bfs(&self, from: &GraphVertex<T>) -> HashMap<GraphVertex<T>, usize> {
        search::distances(&self.adjacency, from)
    }

    /// The greatest timestamp recorded anywhere in the graph.
    pub fn latest_timestamp(&self) -> Option<Ts> {
        self.vertices.latest_timestamp().max(self.edges.latest_timestamp())
    }

    /// Returns true if the edge currently belongs in the adjacency index.
    ///
    /// An endpoint removal at or after the edge's latest add retracts it.
    fn edge_is_live(&self, edge: &GraphEdge<T>) -> bool {
        let added = match self.edges.added_at(edge) {
            Some(added) => added,
            None => return false,
        };
        let survives = |vertex: &GraphVertex<T>| {
            self.vertices.contains(vertex)
                && self.vertices.removed_at(vertex).map_or(true, |removed| added > removed)
        };
        self.edges.contains(edge) && survives(edge.from()) && survives(edge.to())
    }

    /// Brings the vertex's index entry in line with the vertex set.
    fn refresh_vertex(&mut self, vertex: &GraphVertex<T>) {
        if self.vertices.contains(vertex) {
            self.adjacency.entry(vertex.clone()).or_default();
        } else if let Some(edges) = self.adjacency.remove(vertex) {
            for edge in edges {
                if let Some(neighbours) = self.adjacency.get_mut(edge.to()) {
                    neighbours.retain(|e| e.to() != vertex);
                }
            }
        }
    }

    /// Brings the index entries between `a` and `b` in line with the sets.
    fn refresh_link(&mut self, a: &GraphVertex<T>, b: &GraphVertex<T>) {
        let forward = GraphEdge::new(a.clone(), b.clone());
        let backward = forward.inverted();
        if self.edge_is_live(&forward) || self.edge_is_live(&backward) {
            link(&mut self.adjacency, forward);
        } else {
            unlink(&mut self.adjacency, &forward);
        }
    }

    /// Recomputes the whole index from the two sets.
    fn rebuild(&mut self) {
        let mut adjacency: Adjacency<T> =
            self.vertices.iter().map(|vertex| (vertex.clone(), Vec::new())).collect();
        for edge in self.edges.iter() {
            if self.edge_is_live(edge) {
                link(&mut adjacency, edge.clone());
            }
        }
        self.adjacency = adjacency;
    }
}

impl <T, Ts> Default for LwwGraph<T, Ts> where T: Eq + Hash {
    fn default() -> LwwGraph<T, Ts> {
        LwwGraph::new()
    }
}

impl <T, Ts> Crdt for LwwGraph<T, Ts> where T: Clone + Eq + Hash, Ts: Ord + Copy {

    type Operation = GraphOp<T, Ts>;

    /// Merge a replica into the graph.
    ///
    /// The vertex and edge sets are merged independently and the adjacency
    /// index is then rebuilt from scratch, which costs time linear in the
    /// size of both sets.
    ///
    /// ##### Example
    ///
    /// ```
    /// use lwwgraph::graph::{Graph, GraphVertex, LwwGraph};
    /// use lwwgraph::Crdt;
    ///
    /// let (a, b) = (GraphVertex::new("a"), GraphVertex::new("b"));
    /// let mut local = LwwGraph::new();
    /// let mut remote = LwwGraph::new();
    ///
    /// local.add_edge(a, b, 1);
    /// remote.remove_vertex(b, 2);
    ///
    /// local.merge(remote);
    /// assert!(local.lookup(&a));
    /// assert!(!local.lookup(&b));
    /// assert!(local.vertices_connected(&a).is_empty());
    /// ```
    #[instrument(level = "debug", skip_all)]
    fn merge(&mut self, other: LwwGraph<T, Ts>) {
        self.vertices.merge(other.vertices);
        self.edges.merge(other.edges);
        self.rebuild();
        debug!(vertices = self.adjacency.len(),
               links = self.adjacency.values().map(Vec::len).sum::<usize>() / 2,
               "rebuilt adjacency index after merge");
    }

    fn apply(&mut self, op: GraphOp<T, Ts>) {
        match op {
            GraphOp::AddVertex(vertex, ts) => { self.add_vertex(vertex, ts); },
            GraphOp::RemoveVertex(vertex, ts) => { self.remove_vertex(vertex, ts); },
            GraphOp::AddEdge(from, to, ts) => { self.add_edge(from, to, ts); },
            GraphOp::RemoveEdge(edge, ts) => { self.remove_edge(edge, ts); },
        }
    }
}

impl <T, Ts> Graph for LwwGraph<T, Ts> where T: Clone + Eq + Hash, Ts: Ord + Copy {

    type Value = T;
    type Timestamp = Ts;

    fn add_vertex(&mut self, vertex: GraphVertex<T>, timestamp: Ts) -> Option<GraphVertex<T>> {
        self.try_add_vertex(vertex, timestamp).ok()
    }

    fn remove_vertex(&mut self, vertex: GraphVertex<T>, timestamp: Ts) -> Option<GraphVertex<T>> {
        self.try_remove_vertex(vertex, timestamp).ok()
    }

    fn add_edge(&mut self, from: GraphVertex<T>, to: GraphVertex<T>, timestamp: Ts) -> Option<GraphEdge<T>> {
        self.try_add_edge(from, to, timestamp).ok()
    }

    fn remove_edge(&mut self, edge: GraphEdge<T>, timestamp: Ts) -> Option<GraphEdge<T>> {
        self.try_remove_edge(edge, timestamp).ok()
    }

    fn lookup(&self, vertex: &GraphVertex<T>) -> bool {
        self.adjacency.contains_key(vertex)
    }

    fn vertices_connected(&self, vertex: &GraphVertex<T>) -> Vec<GraphVertex<T>> {
        self.adjacency
            .get(vertex)
            .map(|edges| edges.iter().map(|edge| edge.to().clone()).collect())
            .unwrap_or_default()
    }

    fn find_path(&self, from: &GraphVertex<T>, to: &GraphVertex<T>) -> Vec<GraphVertex<T>> {
        search::shortest_path(&self.adjacency, from, to)
    }
}

/// Graphs are equal when their adjacency structures are, ignoring the order
/// of each vertex's edges.
impl <T, Ts> PartialEq for LwwGraph<T, Ts> where T: Eq + Hash {
    fn eq(&self, other: &LwwGraph<T, Ts>) -> bool {
        self.adjacency.len() == other.adjacency.len()
            && self.adjacency.iter().all(|(vertex, edges)| {
                other.adjacency.get(vertex).map_or(false, |theirs| {
                    edges.len() == theirs.len() && edges.iter().all(|edge| theirs.contains(edge))
                })
            })
    }
}

impl <T, Ts> Eq for LwwGraph<T, Ts> where T: Eq + Hash {}

impl <T, Ts> Debug for LwwGraph<T, Ts> where T: Debug + Eq + Hash, Ts: Debug + Ord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("LwwGraph")
         .field("vertices", &self.vertices)
         .field("edges", &self.edges)
         .field("adjacency", &self.adjacency)
         .finish()
    }
}

/// One line per vertex: the vertex, a colon, then its neighbours.
impl <T, Ts> Display for LwwGraph<T, Ts> where T: Display + Eq + Hash {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (vertex, edges) in &self.adjacency {
            write!(f, "{}:", vertex)?;
            for edge in edges {
                write!(f, " {}", edge.to())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Only the two sets are written; the index is rebuilt on the way back in.
#[cfg(feature = "serde")]
impl <T, Ts> Serialize for LwwGraph<T, Ts> where T: Serialize + Eq + Hash, Ts: Serialize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LwwGraph", 2)?;
        state.serialize_field("vertices", &self.vertices)?;
        state.serialize_field("edges", &self.edges)?;
        state.end()
    }
}

#[cfg(feature = "serde")]
impl <'de, T, Ts> Deserialize<'de> for LwwGraph<T, Ts>
where T: Deserialize<'de> + Clone + Eq + Hash, Ts: Deserialize<'de> + Ord + Copy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Sets<T, Ts> where T: Eq + Hash {
            vertices: TimestampedElementSet<GraphVertex<T>, Ts>,
            edges: TimestampedElementSet<GraphEdge<T>, Ts>,
        }

        let Sets { vertices, edges } = Sets::deserialize(deserializer)?;
        Ok(LwwGraph::from_sets(vertices, edges))
    }
}

#[cfg(any(test, feature = "quickcheck_generators"))]
impl <T, Ts> Arbitrary for LwwGraph<T, Ts> where T: Arbitrary + Eq + Hash, Ts: Arbitrary + Ord + Copy {
    fn arbitrary(g: &mut Gen) -> LwwGraph<T, Ts> {
        let operations: Vec<GraphOp<T, Ts>> = Arbitrary::arbitrary(g);
        let mut graph = LwwGraph::new();
        for op in operations {
            graph.apply(op);
        }
        graph
    }
}

#[cfg(any(test, feature = "quickcheck_generators"))]
impl <T, Ts> Arbitrary for GraphOp<T, Ts> where T: Arbitrary, Ts: Arbitrary {
    fn arbitrary(g: &mut Gen) -> GraphOp<T, Ts> {
        match g.choose(&[0u8, 1, 2, 2, 3]) {
            Some(&0) => GraphOp::AddVertex(Arbitrary::arbitrary(g), Arbitrary::arbitrary(g)),
            Some(&1) => GraphOp::RemoveVertex(Arbitrary::arbitrary(g), Arbitrary::arbitrary(g)),
            Some(&2) => GraphOp::AddEdge(Arbitrary::arbitrary(g), Arbitrary::arbitrary(g), Arbitrary::arbitrary(g)),
            _ => GraphOp::RemoveEdge(Arbitrary::arbitrary(g), Arbitrary::arbitrary(g)),
        }
    }
    fn shrink(&self) -> Box<dyn Iterator<Item = GraphOp<T, Ts>>> {
        match self.clone() {
            GraphOp::AddVertex(vertex, ts) => {
                Box::new((vertex, ts).shrink().map(|(v, t)| GraphOp::AddVertex(v, t)))
            }
            GraphOp::RemoveVertex(vertex, ts) => {
                Box::new((vertex, ts).shrink().map(|(v, t)| GraphOp::RemoveVertex(v, t)))
            }
            GraphOp::AddEdge(from, to, ts) => {
                Box::new((from, to, ts).shrink().map(|(f, t, ts)| GraphOp::AddEdge(f, t, ts)))
            }
            GraphOp::RemoveEdge(edge, ts) => {
                Box::new((edge, ts).shrink().map(|(e, t)| GraphOp::RemoveEdge(e, t)))
            }
        }
    }
}
