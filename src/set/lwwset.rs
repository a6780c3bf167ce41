use std::cmp::Ordering::{self, Equal, Greater, Less};
use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::hash::Hash;

#[cfg(any(test, feature = "quickcheck_generators"))]
use quickcheck::{Arbitrary, Gen};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Crdt;

/// A last-writer-wins set.
///
/// Each element maps to at most one add timestamp and at most one remove
/// timestamp, the greatest seen for that side so far.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(serialize = "T: Serialize, Ts: Serialize",
                                          deserialize = "T: Deserialize<'de>, Ts: Deserialize<'de>")))]
pub struct TimestampedElementSet<T, Ts = u64> where T: Eq + Hash {
    #[cfg_attr(feature = "serde", serde(with = "entries"))]
    adds: HashMap<T, Ts>,
    #[cfg_attr(feature = "serde", serde(with = "entries"))]
    removes: HashMap<T, Ts>,
}

/// Timestamp maps are written as sequences of pairs, since elements are not
/// always valid map keys in the target format.
#[cfg(feature = "serde")]
mod entries {
    use std::collections::HashMap;
    use std::hash::Hash;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, Ts, S>(map: &HashMap<T, Ts>, serializer: S) -> Result<S::Ok, S::Error>
    where T: Serialize, Ts: Serialize, S: Serializer {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, T, Ts, D>(deserializer: D) -> Result<HashMap<T, Ts>, D::Error>
    where T: Deserialize<'de> + Eq + Hash, Ts: Deserialize<'de>, D: Deserializer<'de> {
        let entries: Vec<(T, Ts)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

/// An add or remove operation over `TimestampedElementSet` CRDTs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SetOp<T, Ts = u64> {
    Add(T, Ts),
    Remove(T, Ts),
}

/// Stores `timestamp` for `value` unless a timestamp at least as new is
/// already stored. Returns whether the map changed.
fn record<T, Ts>(map: &mut HashMap<T, Ts>, value: T, timestamp: Ts) -> bool
where T: Eq + Hash, Ts: Ord {
    match map.entry(value) {
        Occupied(mut entry) => {
            if timestamp > *entry.get() {
                entry.insert(timestamp);
                true
            } else {
                false
            }
        },
        Vacant(entry) => {
            entry.insert(timestamp);
            true
        },
    }
}

/// Membership from the two latest timestamps of an element. Ties go to remove.
fn is_present<Ts: Ord>(added: Option<&Ts>, removed: Option<&Ts>) -> bool {
    match (added, removed) {
        (Some(added), Some(removed)) => added > removed,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

impl <T, Ts> TimestampedElementSet<T, Ts> where T: Eq + Hash {

    /// Create a new, empty last-writer-wins set.
    ///
    /// ### Example
    ///
    /// ```
    /// use lwwgraph::set::TimestampedElementSet;
    ///
    /// let set = TimestampedElementSet::<i32>::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> TimestampedElementSet<T, Ts> {
        TimestampedElementSet { adds: HashMap::new(), removes: HashMap::new() }
    }
}

impl <T, Ts> TimestampedElementSet<T, Ts> where T: Clone + Eq + Hash, Ts: Ord + Copy {

    /// Add an element to the set at `timestamp`.
    ///
    /// The timestamp is recorded if it is newer than the element's current
    /// add timestamp. Returns the element unless a remove at an equal or later
    /// timestamp has already been recorded, in which case the add is
    /// superseded and `None` is returned.
    ///
    /// ### Example
    ///
    /// ```
    /// use lwwgraph::set::TimestampedElementSet;
    ///
    /// let mut set = TimestampedElementSet::new();
    /// assert_eq!(Some("first-element"), set.add("first-element", 1));
    /// assert!(set.contains(&"first-element"));
    ///
    /// set.remove("second-element", 5);
    /// assert_eq!(None, set.add("second-element", 3));
    /// ```
    pub fn add(&mut self, value: T, timestamp: Ts) -> Option<T> {
        record(&mut self.adds, value.clone(), timestamp);
        match self.removes.get(&value) {
            Some(&removed) if removed >= timestamp => None,
            _ => Some(value),
        }
    }

    /// Remove an element from the set at `timestamp`.
    ///
    /// The timestamp is recorded if it is newer than the element's current
    /// remove timestamp, even for elements which were never added. Returns
    /// the element unless an add at a strictly later timestamp has already
    /// been recorded.
    ///
    /// ### Example
    ///
    /// ```
    /// use lwwgraph::set::TimestampedElementSet;
    ///
    /// let mut set = TimestampedElementSet::new();
    /// set.add("first-element", 0);
    /// assert!(set.contains(&"first-element"));
    /// set.remove("first-element", 1);
    /// assert!(!set.contains(&"first-element"));
    /// ```
    pub fn remove(&mut self, value: T, timestamp: Ts) -> Option<T> {
        record(&mut self.removes, value.clone(), timestamp);
        match self.adds.get(&value) {
            Some(&added) if added > timestamp => None,
            _ => Some(value),
        }
    }

    /// Returns true if the set contains the value.
    pub fn contains(&self, value: &T) -> bool {
        is_present(self.adds.get(value), self.removes.get(value))
    }

    /// Returns true if the set contained the value as of `timestamp`.
    ///
    /// Only recorded timestamps at or before `timestamp` are considered. When
    /// both the add and the remove are, the usual rule applies. When only one
    /// of them is, the value is considered present only if it was removed
    /// strictly before `timestamp` and added again after it.
    pub fn contains_at(&self, value: &T, timestamp: Ts) -> bool {
        let added = match self.adds.get(value) {
            Some(&added) => added,
            None => return false,
        };
        let removed = match self.removes.get(value) {
            Some(&removed) => removed,
            None => return added <= timestamp,
        };
        match (added <= timestamp, removed <= timestamp) {
            (true, true) => added > removed,
            (false, false) => false,
            _ => removed < timestamp && timestamp < added,
        }
    }

    /// The latest add timestamp recorded for the value.
    pub fn added_at(&self, value: &T) -> Option<Ts> {
        self.adds.get(value).copied()
    }

    /// The latest remove timestamp recorded for the value.
    pub fn removed_at(&self, value: &T) -> Option<Ts> {
        self.removes.get(value).copied()
    }

    /// Returns an iterator over the elements currently in the set.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.adds
            .iter()
            .filter(move |&(value, added)| is_present(Some(added), self.removes.get(value)))
            .map(|(value, _)| value)
    }

    /// Returns the elements currently in the set.
    pub fn snapshot(&self) -> HashSet<T> {
        self.iter().cloned().collect()
    }

    /// Returns the elements in the set as of `timestamp`.
    ///
    /// ### Example
    ///
    /// ```
    /// use lwwgraph::set::TimestampedElementSet;
    ///
    /// let mut set = TimestampedElementSet::new();
    /// set.add('a', 1u64);
    /// set.add('b', 4);
    /// assert_eq!(1, set.snapshot_at(2).len());
    /// assert_eq!(2, set.snapshot_at(5).len());
    /// ```
    pub fn snapshot_at(&self, timestamp: Ts) -> HashSet<T> {
        self.adds
            .keys()
            .filter(|value| self.contains_at(value, timestamp))
            .cloned()
            .collect()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if the set contains no elements.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// The greatest timestamp recorded by either an add or a remove.
    pub fn latest_timestamp(&self) -> Option<Ts> {
        self.adds.values().chain(self.removes.values()).copied().max()
    }

    /// Returns true if every timestamp recorded here is recorded in `other`
    /// with an equal or later value.
    fn is_covered_by(&self, other: &TimestampedElementSet<T, Ts>) -> bool {
        let covered = |mine: &HashMap<T, Ts>, theirs: &HashMap<T, Ts>| {
            mine.iter().all(|(value, ts)| theirs.get(value).map_or(false, |other_ts| other_ts >= ts))
        };
        covered(&self.adds, &other.adds) && covered(&self.removes, &other.removes)
    }
}

impl <T, Ts> Default for TimestampedElementSet<T, Ts> where T: Eq + Hash {
    fn default() -> TimestampedElementSet<T, Ts> {
        TimestampedElementSet::new()
    }
}

impl <T, Ts> Crdt for TimestampedElementSet<T, Ts> where T: Clone + Eq + Hash, Ts: Ord + Copy {

    type Operation = SetOp<T, Ts>;

    /// Merge a replica into the set.
    ///
    /// Each side is merged independently by keeping the later timestamp per
    /// element.
    ///
    /// ##### Example
    ///
    /// ```
    /// # use lwwgraph::set::TimestampedElementSet;
    /// use lwwgraph::Crdt;
    ///
    /// let mut local = TimestampedElementSet::new();
    /// let mut remote = TimestampedElementSet::new();
    ///
    /// local.add(1i32, 0);
    /// remote.add(1, 1);
    /// remote.add(2, 2);
    /// remote.remove(1, 3);
    ///
    /// local.merge(remote);
    /// assert!(local.contains(&2));
    /// assert!(!local.contains(&1));
    /// assert_eq!(1, local.len());
    /// ```
    fn merge(&mut self, other: TimestampedElementSet<T, Ts>) {
        for (value, timestamp) in other.adds {
            record(&mut self.adds, value, timestamp);
        }
        for (value, timestamp) in other.removes {
            record(&mut self.removes, value, timestamp);
        }
    }

    /// Apply an add or remove operation to the set.
    ///
    /// Applying an operation to a `TimestampedElementSet` is idempotent.
    ///
    /// ##### Example
    ///
    /// ```
    /// # use lwwgraph::set::{SetOp, TimestampedElementSet};
    /// # use lwwgraph::Crdt;
    /// let mut local = TimestampedElementSet::new();
    ///
    /// local.apply(SetOp::Add(13i32, 0));
    /// assert!(local.contains(&13));
    /// ```
    fn apply(&mut self, op: SetOp<T, Ts>) {
        match op {
            SetOp::Add(value, timestamp) => { self.add(value, timestamp); },
            SetOp::Remove(value, timestamp) => { self.remove(value, timestamp); },
        }
    }
}

impl <T, Ts> PartialEq for TimestampedElementSet<T, Ts> where T: Eq + Hash, Ts: PartialEq {
    fn eq(&self, other: &TimestampedElementSet<T, Ts>) -> bool {
        self.adds == other.adds && self.removes == other.removes
    }
}

impl <T, Ts> Eq for TimestampedElementSet<T, Ts> where T: Eq + Hash, Ts: Eq {}

/// Replicas are ordered by the history they have seen: `a <= b` when `b`
/// has recorded every timestamp `a` has, or a later one.
impl <T, Ts> PartialOrd for TimestampedElementSet<T, Ts> where T: Clone + Eq + Hash, Ts: Ord + Copy {
    fn partial_cmp(&self, other: &TimestampedElementSet<T, Ts>) -> Option<Ordering> {
        match (self.is_covered_by(other), other.is_covered_by(self)) {
            (true, true) => Some(Equal),
            (true, false) => Some(Less),
            (false, true) => Some(Greater),
            (false, false) => None,
        }
    }
}

impl <T, Ts> Debug for TimestampedElementSet<T, Ts> where T: Debug + Eq + Hash, Ts: Debug + Ord {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let present: Vec<_> = self.adds
            .iter()
            .filter(|&(value, added)| is_present(Some(added), self.removes.get(value)))
            .collect();
        let removed: Vec<_> = self.removes
            .iter()
            .filter(|&(value, _)| !is_present(self.adds.get(value), self.removes.get(value)))
            .collect();
        write!(f, "{{present: {:?}, removed: {:?}}}", present, removed)
    }
}

#[cfg(any(test, feature = "quickcheck_generators"))]
impl <T, Ts> Arbitrary for TimestampedElementSet<T, Ts> where T: Arbitrary + Eq + Hash, Ts: Arbitrary {
    fn arbitrary(g: &mut Gen) -> TimestampedElementSet<T, Ts> {
        TimestampedElementSet { adds: Arbitrary::arbitrary(g), removes: Arbitrary::arbitrary(g) }
    }
    fn shrink(&self) -> Box<dyn Iterator<Item = TimestampedElementSet<T, Ts>>> {
        let maps = (self.adds.clone(), self.removes.clone());
        Box::new(maps.shrink().map(|(adds, removes)| TimestampedElementSet { adds, removes }))
    }
}

#[cfg(any(test, feature = "quickcheck_generators"))]
impl <T, Ts> Arbitrary for SetOp<T, Ts> where T: Arbitrary, Ts: Arbitrary {
    fn arbitrary(g: &mut Gen) -> SetOp<T, Ts> {
        if bool::arbitrary(g) {
            SetOp::Add(Arbitrary::arbitrary(g), Arbitrary::arbitrary(g))
        } else {
            SetOp::Remove(Arbitrary::arbitrary(g), Arbitrary::arbitrary(g))
        }
    }
    fn shrink(&self) -> Box<dyn Iterator<Item = SetOp<T, Ts>>> {
        match self.clone() {
            SetOp::Add(value, ts) => {
                Box::new((value, ts).shrink().map(|(v, t)| SetOp::Add(v, t)))
            }
            SetOp::Remove(value, ts) => {
                Box::new((value, ts).shrink().map(|(v, t)| SetOp::Remove(v, t)))
            }
        }
    }
}

#[cfg(test)]
mod test {

    use quickcheck::TestResult;

    use crate::{test, Crdt};
    use super::{SetOp, TimestampedElementSet};

    type C = TimestampedElementSet<u8, u8>;
    type O = SetOp<u8, u8>;

    #[quickcheck]
    fn check_apply_is_commutative(crdt: C, operations: Vec<O>) -> TestResult {
        test::apply_is_commutative(crdt, operations)
    }

    #[quickcheck]
    fn check_merge_is_commutative(crdt: C, others: Vec<C>) -> TestResult {
        test::merge_is_commutative(crdt, others)
    }

    #[quickcheck]
    fn check_merge_is_associative(a: C, b: C, c: C) -> bool {
        test::merge_is_associative(a, b, c)
    }

    #[quickcheck]
    fn check_merge_is_idempotent(crdt: C) -> bool {
        test::merge_is_idempotent(crdt)
    }

    #[quickcheck]
    fn check_local_add(elements: Vec<u8>) -> bool {
        let mut set = TimestampedElementSet::new();
        for element in elements.clone() {
            set.add(element, 0u8);
        }

        elements.iter().all(|element| set.contains(element))
    }

    #[quickcheck]
    fn check_ordering_lte(mut a: C, b: C) -> bool {
        a.merge(b.clone());
        a >= b && b <= a
    }

    #[quickcheck]
    fn check_ordering_lt(mut a: C, b: C) -> TestResult {
        a.merge(b.clone());
        if a.latest_timestamp() == Some(u8::MAX) {
            return TestResult::discard();
        }
        let newest = a.latest_timestamp().map_or(0, |ts| ts + 1);
        a.add(0, newest);
        TestResult::from_bool(a > b && b < a)
    }

    #[quickcheck]
    fn check_ordering_equality(mut a: C, mut b: C) -> bool {
        a.merge(b.clone());
        b.merge(a.clone());
        a == b && a.partial_cmp(&b) == Some(std::cmp::Ordering::Equal)
    }

    #[quickcheck]
    fn check_older_timestamps_are_ignored(element: u8, added: u8, removed: u8, older: u8) -> bool {
        let mut set = C::new();
        set.add(element, added);
        set.remove(element, removed);
        let before = set.contains(&element);

        set.add(element, added.min(older));
        set.remove(element, removed.min(older));
        set.contains(&element) == before
            && set.added_at(&element) == Some(added)
            && set.removed_at(&element) == Some(removed)
    }

    #[test]
    fn remove_wins_ties() {
        let mut set = TimestampedElementSet::new();
        assert_eq!(Some("a"), set.add("a", 7u64));
        assert_eq!(Some("a"), set.remove("a", 7));
        assert!(!set.contains(&"a"));

        let mut reversed = TimestampedElementSet::new();
        assert_eq!(Some("a"), reversed.remove("a", 7u64));
        assert_eq!(None, reversed.add("a", 7));
        assert!(!reversed.contains(&"a"));
        assert_eq!(set, reversed);
    }

    #[test]
    fn superseded_operations_still_record_timestamps() {
        let mut set = TimestampedElementSet::new();
        set.remove("a", 10u64);

        assert_eq!(None, set.add("a", 4));
        assert_eq!(Some(4), set.added_at(&"a"));
        assert!(!set.contains(&"a"));

        assert_eq!(Some("a"), set.add("a", 11));
        assert_eq!(None, set.remove("a", 9));
        assert_eq!(Some(10), set.removed_at(&"a"));
        assert!(set.contains(&"a"));
    }

    #[test]
    fn unknown_elements_are_absent() {
        let set = TimestampedElementSet::<&str>::new();
        assert!(!set.contains(&"missing"));
        assert!(!set.contains_at(&"missing", 100));
        assert_eq!(None, set.added_at(&"missing"));
        assert_eq!(None, set.latest_timestamp());
    }

    #[test]
    fn contains_at_reads_history() {
        let mut set = TimestampedElementSet::new();
        set.add("a", 2u64);
        assert!(!set.contains_at(&"a", 1));
        assert!(set.contains_at(&"a", 2));
        assert!(set.contains_at(&"a", 9));

        set.remove("a", 5);
        // Both recorded timestamps are in the past at 6.
        assert!(!set.contains_at(&"a", 6));
        // Only the add is, and the remove comes later.
        assert!(!set.contains_at(&"a", 3));

        set.add("a", 8);
        // Only the remove is, and the value is added again afterwards.
        assert!(set.contains_at(&"a", 6));
        assert!(!set.contains_at(&"a", 5));
        assert!(set.contains_at(&"a", 8));
    }

    #[test]
    fn snapshots() {
        let mut set = TimestampedElementSet::new();
        set.add(1, 1u64);
        set.add(2, 2);
        set.add(3, 3);
        set.remove(2, 4);

        assert_eq!(vec![1, 3], sorted(set.snapshot()));
        assert_eq!(vec![1], sorted(set.snapshot_at(1)));
        assert_eq!(vec![1, 3], sorted(set.snapshot_at(3)));
        assert_eq!(vec![1, 3], sorted(set.snapshot_at(9)));
        assert_eq!(2, set.len());
        assert_eq!(Some(4), set.latest_timestamp());
    }

    #[test]
    fn merging_leaves_inputs_untouched() {
        let mut a = TimestampedElementSet::new();
        let mut b = TimestampedElementSet::new();
        a.add('x', 1u64);
        b.remove('x', 2);
        b.add('y', 1);

        let merged = a.merging(&b);
        assert!(a.contains(&'x'));
        assert!(!merged.contains(&'x'));
        assert!(merged.contains(&'y'));
        assert_eq!(merged, b.merging(&a));
    }

    fn sorted(set: std::collections::HashSet<i32>) -> Vec<i32> {
        let mut values: Vec<i32> = set.into_iter().collect();
        values.sort();
        values
    }
}
