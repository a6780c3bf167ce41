//! Utility functions for using CRDTs in tests.
//!
//! The generic checks here state the laws every CRDT in the crate obeys, and
//! are instantiated per type with `quickcheck`.

use quickcheck::{Arbitrary, Gen, TestResult};

use crate::Crdt;

/// A vertex drawn from a handful of names, so that generated operations
/// collide on the same vertices and edges often.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(pub u8);

impl Arbitrary for Node {
    fn arbitrary(g: &mut Gen) -> Node {
        Node(u8::arbitrary(g) % 5)
    }
    fn shrink(&self) -> Box<dyn Iterator<Item = Node>> {
        Box::new(self.0.shrink().map(Node))
    }
}

/// A timestamp drawn from a narrow range, so that ties are common.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tick(pub u8);

impl Arbitrary for Tick {
    fn arbitrary(g: &mut Gen) -> Tick {
        Tick(u8::arbitrary(g) % 12)
    }
    fn shrink(&self) -> Box<dyn Iterator<Item = Tick>> {
        Box::new(self.0.shrink().map(Tick))
    }
}

/// Returns every ordering of `items`.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut permutation in permutations(&rest) {
            permutation.insert(0, item.clone());
            result.push(permutation);
        }
    }
    result
}

/// Applying the same operations in any order yields the same replica.
pub fn apply_is_commutative<C: Crdt>(crdt: C, operations: Vec<C::Operation>) -> TestResult {
    // This test takes too long with too many operations, so we truncate
    let truncated: Vec<C::Operation> = operations.into_iter().take(5).collect();

    let mut reference = crdt.clone();
    for operation in truncated.iter().cloned() {
        reference.apply(operation);
    }

    let converged = permutations(&truncated)
        .into_iter()
        .map(|permutation| {
            permutation.into_iter().fold(crdt.clone(), |mut replica, op| {
                replica.apply(op);
                replica
            })
        })
        .all(|replica| replica == reference);
    TestResult::from_bool(converged)
}

/// Merging the same replicas in any order yields the same replica.
pub fn merge_is_commutative<C: Crdt>(crdt: C, others: Vec<C>) -> TestResult {
    // This test takes too long with too many replicas, so we truncate
    let truncated: Vec<C> = others.into_iter().take(4).collect();

    let mut reference = crdt.clone();
    for other in truncated.iter().cloned() {
        reference.merge(other);
    }

    let converged = permutations(&truncated)
        .into_iter()
        .map(|permutation| {
            permutation.into_iter().fold(crdt.clone(), |mut replica, other| {
                replica.merge(other);
                replica
            })
        })
        .all(|replica| replica == reference);
    TestResult::from_bool(converged)
}

/// `(a ⊔ b) ⊔ c == a ⊔ (b ⊔ c)`
pub fn merge_is_associative<C: Crdt>(a: C, b: C, c: C) -> bool {
    a.merging(&b).merging(&c) == a.merging(&b.merging(&c))
}

/// `a ⊔ a == a`
pub fn merge_is_idempotent<C: Crdt>(crdt: C) -> bool {
    crdt.merging(&crdt) == crdt
}
