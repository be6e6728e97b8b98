//! Executed configuration trees: the cacheable unit and its evaluation.
//!
//! A [`ResolvedSet`] is a slot tree whose operation logs have been run into
//! item sequences. It may still contain deferred placeholders — those are
//! only substituted by [`ResolvedSet::evaluate`], per fetch, against the
//! caller's context. The registry caches resolved sets; evaluated
//! [`AttrSet`]s are transient and never cached.

use indexmap::IndexMap;

use crate::attrs::{AttrSet, AttrValue, SlotAttrs};
use crate::context::DeferredSource;
use crate::op::run_ops;
use crate::tree::{AttrEntry, AttrMap, SlotNode, SlotTree};
use crate::value::Value;

/// An executed attribute value: a flat item sequence, or a nested group
/// for nesting-capable fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Items(Vec<Value>),
    Group(IndexMap<String, ResolvedValue>),
}

impl ResolvedValue {
    pub fn has_deferred(&self) -> bool {
        match self {
            ResolvedValue::Items(items) => items.iter().any(Value::is_deferred),
            ResolvedValue::Group(group) => group.values().any(ResolvedValue::has_deferred),
        }
    }

    fn evaluate(&self, ctx: &dyn DeferredSource) -> AttrValue {
        match self {
            ResolvedValue::Items(items) => AttrValue::Text(join_items(items, ctx)),
            ResolvedValue::Group(group) => AttrValue::Group(
                group
                    .iter()
                    .map(|(name, value)| (name.clone(), value.evaluate(ctx)))
                    .collect(),
            ),
        }
    }
}

/// One executed slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSlot {
    attrs: IndexMap<String, ResolvedValue>,
    children: IndexMap<String, ResolvedSlot>,
    has_deferred: bool,
}

impl ResolvedSlot {
    fn from_node(node: &SlotNode) -> Self {
        let attrs = resolve_attrs(&node.attrs);
        let children: IndexMap<String, ResolvedSlot> = node
            .children
            .iter()
            .map(|(name, child)| (name.clone(), ResolvedSlot::from_node(child)))
            .collect();
        let has_deferred = attrs.values().any(ResolvedValue::has_deferred)
            || children.values().any(|child| child.has_deferred);
        ResolvedSlot {
            attrs,
            children,
            has_deferred,
        }
    }

    pub fn attrs(&self) -> &IndexMap<String, ResolvedValue> {
        &self.attrs
    }

    pub fn children(&self) -> &IndexMap<String, ResolvedSlot> {
        &self.children
    }

    pub fn get(&self, attr: &str) -> Option<&ResolvedValue> {
        self.attrs.get(attr)
    }

    pub fn has_deferred(&self) -> bool {
        self.has_deferred
    }

    /// Evaluates this slot alone into concrete attributes.
    pub fn evaluate(&self, ctx: &dyn DeferredSource) -> SlotAttrs {
        SlotAttrs {
            attrs: self
                .attrs
                .iter()
                .map(|(name, value)| (name.clone(), value.evaluate(ctx)))
                .collect(),
            children: self
                .children
                .iter()
                .map(|(name, child)| (name.clone(), child.evaluate(ctx)))
                .collect(),
        }
    }
}

/// A fully executed slot tree, shared out of the cache behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSet {
    slots: IndexMap<String, ResolvedSlot>,
    has_deferred: bool,
}

impl ResolvedSet {
    pub(crate) fn from_tree(tree: &SlotTree) -> Self {
        let mut slots = IndexMap::new();
        let mut has_deferred = false;
        for (name, node) in &tree.slots {
            let slot = ResolvedSlot::from_node(node);
            has_deferred |= slot.has_deferred;
            slots.insert(name.clone(), slot);
        }
        ResolvedSet {
            slots,
            has_deferred,
        }
    }

    pub fn slots(&self) -> &IndexMap<String, ResolvedSlot> {
        &self.slots
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedSlot> {
        self.slots.get(name)
    }

    /// True when any slot still carries a deferred placeholder; evaluation
    /// of such a set is context-dependent.
    pub fn has_deferred(&self) -> bool {
        self.has_deferred
    }

    /// Narrows to a nested slot path. `None` when any element is absent.
    pub fn dig(&self, path: &[&str]) -> Option<&ResolvedSlot> {
        let (first, rest) = path.split_first()?;
        let mut slot = self.slots.get(*first)?;
        for name in rest {
            slot = slot.children.get(*name)?;
        }
        Some(slot)
    }

    /// Evaluates deferred placeholders against `ctx` and joins item
    /// sequences with single spaces into final strings.
    ///
    /// This runs per fetch, after cache lookup, so two evaluations of the
    /// same cached set under different contexts yield independent results.
    pub fn evaluate(&self, ctx: &dyn DeferredSource) -> AttrSet {
        AttrSet::new(
            self.slots
                .iter()
                .map(|(name, slot)| (name.clone(), slot.evaluate(ctx)))
                .collect(),
        )
    }
}

fn resolve_attrs(map: &AttrMap) -> IndexMap<String, ResolvedValue> {
    map.iter()
        .map(|(name, entry)| {
            let value = match entry {
                AttrEntry::Ops(ops) => ResolvedValue::Items(run_ops(ops)),
                AttrEntry::Group(group) => ResolvedValue::Group(resolve_attrs(group)),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Substitutes deferred placeholders and joins with single spaces.
/// Placeholders with no binding are dropped from the sequence.
fn join_items(items: &[Value], ctx: &dyn DeferredSource) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Literal(text) => parts.push(text.clone()),
            Value::Deferred(id) => {
                if let Some(text) = ctx.deferred_value(id) {
                    parts.push(text);
                }
            }
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvalContext;
    use crate::parse::parse_slot_tree;
    use serde_json::json;

    fn resolved(raw: serde_json::Value) -> ResolvedSet {
        ResolvedSet::from_tree(&parse_slot_tree(&raw).unwrap())
    }

    #[test]
    fn execution_runs_logs_into_items() {
        let set = resolved(json!({
            "class": [{"set": ["a", "b"]}, {"append": ["c"]}, {"remove": ["a"]}]
        }));
        assert_eq!(
            set.get("main").unwrap().get("class"),
            Some(&ResolvedValue::Items(vec![
                Value::literal("b"),
                Value::literal("c"),
            ]))
        );
    }

    #[test]
    fn empty_log_evaluates_to_empty_string() {
        let set = resolved(json!({"class": []}));
        let attrs = set.evaluate(&());
        assert_eq!(attrs.main().unwrap().text("class"), Some(""));
    }

    #[test]
    fn items_join_with_single_spaces() {
        let set = resolved(json!({"class": ["a", "b", "c"]}));
        let attrs = set.evaluate(&());
        assert_eq!(attrs.main().unwrap().text("class"), Some("a b c"));
    }

    #[test]
    fn groups_evaluate_recursively() {
        let set = resolved(json!({"data": {"controller": "menu", "open": false}}));
        let attrs = set.evaluate(&());
        let data = attrs.main().unwrap().get("data").unwrap();
        let group = data.as_group().unwrap();
        assert_eq!(group["controller"].as_text(), Some("menu"));
        assert_eq!(group["open"].as_text(), Some("false"));
    }

    #[test]
    fn deferred_flag_survives_execution() {
        let set = resolved(json!({"id": {"defer": "x"}}));
        assert!(set.has_deferred());
        assert!(set.get("main").unwrap().has_deferred());

        let concrete = resolved(json!({"id": "fixed"}));
        assert!(!concrete.has_deferred());
    }

    #[test]
    fn evaluation_substitutes_per_context() {
        let set = resolved(json!({"class": ["static", {"defer": "mode"}]}));

        let light = EvalContext::new().bind("mode", || "light".to_string());
        let dark = EvalContext::new().bind("mode", || "dark".to_string());

        assert_eq!(
            set.evaluate(&light).main().unwrap().text("class"),
            Some("static light")
        );
        assert_eq!(
            set.evaluate(&dark).main().unwrap().text("class"),
            Some("static dark")
        );
    }

    #[test]
    fn unbound_placeholder_is_dropped() {
        let set = resolved(json!({"class": ["a", {"defer": "missing"}, "b"]}));
        let attrs = set.evaluate(&());
        assert_eq!(attrs.main().unwrap().text("class"), Some("a b"));
    }

    #[test]
    fn dig_walks_children() {
        let set = resolved(json!({
            "card": {
                "class": "card",
                "header": {
                    "class": "hd",
                    "title": {"class": "ttl"}
                }
            }
        }));
        assert!(set.dig(&["card"]).is_some());
        assert!(set.dig(&["card", "header", "title"]).is_some());
        assert!(set.dig(&["card", "footer"]).is_none());
        assert!(set.dig(&["nope"]).is_none());
        assert!(set.dig(&[]).is_none());
    }
}
