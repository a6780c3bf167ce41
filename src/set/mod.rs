//! Set CRDTs.
//!
//! The `add` and `remove` operations on sets do not commute, so a traditional
//! set cannot be a CRDT. [`TimestampedElementSet`] approximates one by
//! attaching a caller-supplied timestamp to every operation and resolving
//! concurrent adds and removes of the same element by those timestamps.
//!
//! ######  `TimestampedElementSet`
//!
//! A last-writer-wins set. For every element it has seen, the set keeps the
//! greatest add timestamp and the greatest remove timestamp, and nothing
//! else. An element is a member when its latest add is strictly newer than
//! its latest remove; an add and a remove at the same timestamp resolve to
//! removed. Removed elements are kept as tombstones forever, since forgetting
//! a remove timestamp would let an older add win on some later merge.

pub use self::lwwset::{SetOp, TimestampedElementSet};

mod lwwset;
