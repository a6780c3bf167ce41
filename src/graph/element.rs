use std::fmt::{self, Display, Formatter};

#[cfg(any(test, feature = "quickcheck_generators"))]
use quickcheck::{Arbitrary, Gen};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A graph vertex, identified by the value it wraps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphVertex<T>(T);

impl <T> GraphVertex<T> {

    /// Create a vertex wrapping `value`.
    pub fn new(value: T) -> GraphVertex<T> {
        GraphVertex(value)
    }

    /// The wrapped value.
    pub fn value(&self) -> &T {
        &self.0
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl <T> From<T> for GraphVertex<T> {
    fn from(value: T) -> GraphVertex<T> {
        GraphVertex(value)
    }
}

impl <T> Display for GraphVertex<T> where T: Display {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A graph edge: an ordered pair of vertices.
///
/// `(a, b)` and `(b, a)` are distinct edges. Graphs record whichever
/// orientation was added and index it in both directions, so traversal over
/// edges is undirected. Removing either orientation removes both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphEdge<T> {
    from: GraphVertex<T>,
    to: GraphVertex<T>,
}

impl <T> GraphEdge<T> {

    /// Create an edge from `from` to `to`.
    ///
    /// ##### Example
    ///
    /// ```
    /// use lwwgraph::graph::{GraphEdge, GraphVertex};
    ///
    /// let edge = GraphEdge::new(GraphVertex::new('a'), GraphVertex::new('b'));
    /// assert_eq!(&'a', edge.from().value());
    /// assert_ne!(edge, edge.inverted());
    /// ```
    pub fn new(from: GraphVertex<T>, to: GraphVertex<T>) -> GraphEdge<T> {
        GraphEdge { from, to }
    }

    pub fn from(&self) -> &GraphVertex<T> {
        &self.from
    }

    pub fn to(&self) -> &GraphVertex<T> {
        &self.to
    }

    /// The endpoints as a `(from, to)` pair.
    pub fn into_vertices(self) -> (GraphVertex<T>, GraphVertex<T>) {
        (self.from, self.to)
    }
}

impl <T> GraphEdge<T> where T: PartialEq {

    /// Returns true if both endpoints are the same vertex.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl <T> GraphEdge<T> where T: Clone {

    /// The same edge running the other way.
    pub fn inverted(&self) -> GraphEdge<T> {
        GraphEdge { from: self.to.clone(), to: self.from.clone() }
    }
}

impl <T> Display for GraphEdge<T> where T: Display {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[cfg(any(test, feature = "quickcheck_generators"))]
impl <T> Arbitrary for GraphVertex<T> where T: Arbitrary {
    fn arbitrary(g: &mut Gen) -> GraphVertex<T> {
        GraphVertex(Arbitrary::arbitrary(g))
    }
    fn shrink(&self) -> Box<dyn Iterator<Item = GraphVertex<T>>> {
        Box::new(self.0.shrink().map(GraphVertex))
    }
}

#[cfg(any(test, feature = "quickcheck_generators"))]
impl <T> Arbitrary for GraphEdge<T> where T: Arbitrary {
    fn arbitrary(g: &mut Gen) -> GraphEdge<T> {
        GraphEdge { from: Arbitrary::arbitrary(g), to: Arbitrary::arbitrary(g) }
    }
    fn shrink(&self) -> Box<dyn Iterator<Item = GraphEdge<T>>> {
        let pair = (self.from.clone(), self.to.clone());
        Box::new(pair.shrink().map(|(from, to)| GraphEdge { from, to }))
    }
}

#[cfg(test)]
mod test {

    use std::collections::HashSet;

    use super::{GraphEdge, GraphVertex};

    #[test]
    fn edges_are_ordered_pairs() {
        let a = GraphVertex::new("a");
        let b = GraphVertex::new("b");
        let forward = GraphEdge::new(a, b);
        let backward = forward.inverted();

        assert_eq!(&b, backward.from());
        assert_eq!(&a, backward.to());
        assert_eq!(forward, backward.inverted());

        let edges: HashSet<_> = vec![forward, backward, forward].into_iter().collect();
        assert_eq!(2, edges.len());
    }

    #[test]
    fn self_loops() {
        let a = GraphVertex::from(1);
        assert!(GraphEdge::new(a, a).is_self_loop());
        assert!(!GraphEdge::new(a, GraphVertex::from(2)).is_self_loop());
    }

    #[test]
    fn display() {
        let edge = GraphEdge::new(GraphVertex::new("a"), GraphVertex::new("b"));
        assert_eq!("a -> b", edge.to_string());
    }
}
