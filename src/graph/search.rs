//! Breadth-first traversal over an adjacency index.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use super::{GraphEdge, GraphVertex};

/// Vertex to the edges leaving it. Every edge in a vertex's list starts at
/// that vertex.
pub(crate) type Adjacency<T> = HashMap<GraphVertex<T>, Vec<GraphEdge<T>>>;

/// Hop counts from `from` to every vertex reachable from it.
pub(crate) fn distances<T>(adjacency: &Adjacency<T>, from: &GraphVertex<T>) -> HashMap<GraphVertex<T>, usize>
where T: Clone + Eq + Hash {
    let mut distances = HashMap::new();
    if !adjacency.contains_key(from) {
        return distances;
    }

    let mut queue = VecDeque::new();
    distances.insert(from.clone(), 0);
    queue.push_back(from.clone());

    while let Some(vertex) = queue.pop_front() {
        let next = distances[&vertex] + 1;
        for edge in adjacency.get(&vertex).into_iter().flatten() {
            if !distances.contains_key(edge.to()) {
                distances.insert(edge.to().clone(), next);
                queue.push_back(edge.to().clone());
            }
        }
    }
    distances
}

/// A path with the fewest edges from `from` to `to`, both included.
///
/// Among equally short paths the one found first in adjacency order wins.
/// Empty when there is no path or either vertex is not in the index.
pub(crate) fn shortest_path<T>(adjacency: &Adjacency<T>, from: &GraphVertex<T>, to: &GraphVertex<T>) -> Vec<GraphVertex<T>>
where T: Clone + Eq + Hash {
    if !adjacency.contains_key(from) || !adjacency.contains_key(to) {
        return Vec::new();
    }
    if from == to {
        return vec![from.clone()];
    }

    let mut parents: HashMap<GraphVertex<T>, GraphVertex<T>> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(from.clone());

    while let Some(vertex) = queue.pop_front() {
        for edge in adjacency.get(&vertex).into_iter().flatten() {
            let next = edge.to();
            if next == from || parents.contains_key(next) {
                continue;
            }
            parents.insert(next.clone(), vertex.clone());
            if next == to {
                return unwind(&parents, from, to);
            }
            queue.push_back(next.clone());
        }
    }
    Vec::new()
}

fn unwind<T>(parents: &HashMap<GraphVertex<T>, GraphVertex<T>>, from: &GraphVertex<T>, to: &GraphVertex<T>) -> Vec<GraphVertex<T>>
where T: Clone + Eq + Hash {
    let mut path = vec![to.clone()];
    let mut current = to;
    while current != from {
        match parents.get(current) {
            Some(parent) => {
                path.push(parent.clone());
                current = parent;
            },
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod test {

    use std::collections::HashMap;

    use crate::graph::{Graph, GraphEdge, GraphVertex, LwwGraph};

    fn v(name: &'static str) -> GraphVertex<&'static str> {
        GraphVertex::new(name)
    }

    /// A–B–D, A–C, A–E–B, D–E–F, E–F
    fn sample() -> LwwGraph<&'static str> {
        let mut graph = LwwGraph::new();
        let edges = [("A", "B"), ("B", "D"), ("A", "C"), ("A", "E"), ("E", "B"), ("D", "E"), ("E", "F")];
        for (ts, &(from, to)) in edges.iter().enumerate() {
            assert!(graph.add_edge(v(from), v(to), ts as u64 + 1).is_some());
        }
        graph
    }

    #[test]
    fn shortest_path_after_edge_removal() {
        let mut graph = sample();
        assert_eq!(6, graph.count());
        assert_eq!(vec![v("C"), v("A"), v("B")], graph.find_path(&v("C"), &v("B")));

        assert!(graph.remove_edge(GraphEdge::new(v("A"), v("B")), 20).is_some());
        assert_eq!(vec![v("C"), v("A"), v("E"), v("F")], graph.find_path(&v("C"), &v("F")));
        assert_eq!(vec![v("F"), v("E"), v("A"), v("C")], graph.find_path(&v("F"), &v("C")));
    }

    #[test]
    fn no_path_between_components() {
        let mut graph = sample();
        graph.add_edge(v("X"), v("Y"), 30);

        assert!(graph.find_path(&v("A"), &v("X")).is_empty());
        assert!(graph.find_path(&v("Y"), &v("F")).is_empty());
        assert_eq!(vec![v("X"), v("Y")], graph.find_path(&v("X"), &v("Y")));
    }

    #[test]
    fn path_to_unknown_or_same_vertex() {
        let graph = sample();
        assert!(graph.find_path(&v("A"), &v("Z")).is_empty());
        assert!(graph.find_path(&v("Z"), &v("A")).is_empty());
        assert!(graph.find_path(&v("Z"), &v("Z")).is_empty());
        assert_eq!(vec![v("D")], graph.find_path(&v("D"), &v("D")));
    }

    #[test]
    fn bfs_distances() {
        let graph = sample();
        let expected: HashMap<_, _> = vec![
            (v("C"), 0), (v("A"), 1), (v("B"), 2), (v("E"), 2), (v("D"), 3), (v("F"), 3),
        ].into_iter().collect();
        assert_eq!(expected, graph.connected_vertices_bfs(&v("C")));
        assert!(graph.connected_vertices_bfs(&v("Z")).is_empty());
    }

    #[test]
    fn bfs_skips_unreachable_vertices() {
        let mut graph = sample();
        graph.add_vertex(v("lonely"), 40);
        let distances = graph.connected_vertices_bfs(&v("A"));
        assert_eq!(6, distances.len());
        assert!(!distances.contains_key(&v("lonely")));
        assert_eq!(Some(&0), graph.connected_vertices_bfs(&v("lonely")).get(&v("lonely")));
    }
}
