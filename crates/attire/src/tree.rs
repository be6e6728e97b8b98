//! The canonical parsed shape shared by every configuration source.
//!
//! The normalizer turns the base, each variant option, each compound payload
//! and per-call adjustments all into the same recursive shape: a
//! [`SlotTree`] of named [`SlotNode`]s, whose attribute leaves are operation
//! logs. Because everything has one shape, the merge rule below is the only
//! combination logic in the crate.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::op::Op;

/// Ordered map of attribute name to entry.
pub type AttrMap = IndexMap<String, AttrEntry>;

/// What an attribute name holds: an operation log, or a nested group of
/// sub-attributes (only nesting-capable fields such as `data`/`aria`
/// produce groups).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrEntry {
    Ops(Vec<Op>),
    Group(AttrMap),
}

impl AttrEntry {
    /// Returns `true` if any value anywhere under this entry is deferred.
    pub fn has_deferred(&self) -> bool {
        match self {
            AttrEntry::Ops(ops) => ops.iter().any(Op::has_deferred),
            AttrEntry::Group(group) => group.values().any(AttrEntry::has_deferred),
        }
    }
}

/// One addressable region: its attributes plus nested child regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotNode {
    pub attrs: AttrMap,
    pub children: IndexMap<String, SlotNode>,
    /// True when any value under this node (attributes or descendants) is a
    /// deferred placeholder. Set by the normalizer, kept current by merging.
    pub has_deferred: bool,
}

impl SlotNode {
    /// Deep-merges `other` onto `self` per the merge rule: matching
    /// operation logs concatenate (self's operations first), matching
    /// nested structure recurses, and on a type conflict the incoming
    /// side wins.
    pub fn merge_from(&mut self, other: &SlotNode) {
        merge_attrs(&mut self.attrs, &other.attrs);
        for (name, child) in &other.children {
            match self.children.entry(name.clone()) {
                Entry::Occupied(mut held) => held.get_mut().merge_from(child),
                Entry::Vacant(open) => {
                    open.insert(child.clone());
                }
            }
        }
        self.has_deferred |= other.has_deferred;
    }
}

/// Root of the canonical shape: a mapping of named slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotTree {
    pub slots: IndexMap<String, SlotNode>,
}

impl SlotTree {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` if any slot in the tree carries a deferred value.
    pub fn has_deferred(&self) -> bool {
        self.slots.values().any(|slot| slot.has_deferred)
    }

    /// Deep-merges `other` onto `self`, slot by slot. Merging never
    /// reorders or drops operations.
    pub fn merge_from(&mut self, other: &SlotTree) {
        for (name, node) in &other.slots {
            match self.slots.entry(name.clone()) {
                Entry::Occupied(mut held) => held.get_mut().merge_from(node),
                Entry::Vacant(open) => {
                    open.insert(node.clone());
                }
            }
        }
    }
}

/// Merges attribute maps: matching operation logs concatenate (left
/// operations first), matching groups recurse, and type conflicts resolve
/// toward the right side.
pub fn merge_attrs(left: &mut AttrMap, right: &AttrMap) {
    for (name, entry) in right {
        match left.entry(name.clone()) {
            Entry::Occupied(mut held) => match (held.get_mut(), entry) {
                (AttrEntry::Ops(ours), AttrEntry::Ops(theirs)) => {
                    ours.extend(theirs.iter().cloned());
                }
                (AttrEntry::Group(ours), AttrEntry::Group(theirs)) => {
                    merge_attrs(ours, theirs);
                }
                (held, incoming) => {
                    *held = incoming.clone();
                }
            },
            Entry::Vacant(open) => {
                open.insert(entry.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{OpKind, run_ops};
    use crate::value::Value;

    fn set(items: &[&str]) -> AttrEntry {
        AttrEntry::Ops(vec![Op::set(
            items.iter().map(|s| Value::literal(*s)).collect(),
        )])
    }

    fn append(items: &[&str]) -> AttrEntry {
        AttrEntry::Ops(vec![Op::new(
            OpKind::Append,
            items.iter().map(|s| Value::literal(*s)).collect(),
        )])
    }

    #[test]
    fn merging_logs_concatenates_left_first() {
        let mut left = AttrMap::new();
        left.insert("class".to_string(), set(&["a"]));
        let mut right = AttrMap::new();
        right.insert("class".to_string(), append(&["b"]));

        merge_attrs(&mut left, &right);

        match &left["class"] {
            AttrEntry::Ops(ops) => {
                assert_eq!(ops.len(), 2);
                assert_eq!(ops[0].kind, OpKind::Set);
                assert_eq!(ops[1].kind, OpKind::Append);
                assert_eq!(
                    run_ops(ops),
                    vec![Value::literal("a"), Value::literal("b")]
                );
            }
            AttrEntry::Group(_) => panic!("expected an operation log"),
        }
    }

    #[test]
    fn merging_groups_recurses() {
        let mut inner_left = AttrMap::new();
        inner_left.insert("role".to_string(), set(&["button"]));
        let mut left = AttrMap::new();
        left.insert("data".to_string(), AttrEntry::Group(inner_left));

        let mut inner_right = AttrMap::new();
        inner_right.insert("id".to_string(), set(&["x"]));
        let mut right = AttrMap::new();
        right.insert("data".to_string(), AttrEntry::Group(inner_right));

        merge_attrs(&mut left, &right);

        match &left["data"] {
            AttrEntry::Group(group) => {
                assert!(group.contains_key("role"));
                assert!(group.contains_key("id"));
            }
            AttrEntry::Ops(_) => panic!("expected a group"),
        }
    }

    #[test]
    fn type_conflict_resolves_right() {
        let mut left = AttrMap::new();
        left.insert("data".to_string(), set(&["plain"]));
        let mut inner = AttrMap::new();
        inner.insert("id".to_string(), set(&["x"]));
        let mut right = AttrMap::new();
        right.insert("data".to_string(), AttrEntry::Group(inner));

        merge_attrs(&mut left, &right);
        assert!(matches!(&left["data"], AttrEntry::Group(_)));
    }

    #[test]
    fn left_only_keys_survive() {
        let mut left = AttrMap::new();
        left.insert("class".to_string(), set(&["a"]));
        let right = AttrMap::new();

        merge_attrs(&mut left, &right);
        assert!(left.contains_key("class"));
    }

    #[test]
    fn tree_merge_adds_new_slots() {
        let mut left = SlotTree::default();
        left.slots.insert("main".to_string(), SlotNode::default());
        let mut right = SlotTree::default();
        right.slots.insert("icon".to_string(), SlotNode::default());

        left.merge_from(&right);
        assert_eq!(
            left.slots.keys().collect::<Vec<_>>(),
            vec!["main", "icon"]
        );
    }

    #[test]
    fn merge_propagates_deferred_flag() {
        let mut left = SlotNode::default();
        let right = SlotNode {
            has_deferred: true,
            ..SlotNode::default()
        };
        left.merge_from(&right);
        assert!(left.has_deferred);
    }
}
