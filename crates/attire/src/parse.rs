//! The normalizer: arbitrary nested raw input into canonical slot trees.
//!
//! Every configuration source passes through here — the base, each variant
//! option, each compound payload, and per-call adjustments — so the rest of
//! the crate only ever handles one shape.
//!
//! # Input shapes
//!
//! Raw input is a [`serde_json::Value`] (YAML documents are converted first;
//! mapping order is preserved). At each attribute position:
//!
//! - a scalar or a sequence of scalars becomes a single `set` operation
//!   (numbers and booleans are stringified at parse time, `null` becomes
//!   the empty string);
//! - a mapping with exactly one operation key (`set`/`append`/`prepend`/
//!   `remove`) is an inline operation;
//! - `{"defer": "<id>"}` is a deferred placeholder, preserved as an opaque
//!   id until evaluation;
//! - a sequence containing operation objects is used as the operation log
//!   directly, element by element;
//! - a mapping under a nesting-capable key (`data`, `aria`) is a nested
//!   attribute group;
//! - any other mapping is a child region and recurses as a slot body.
//!
//! # Single-slot collapse
//!
//! A mapping whose values are all attribute-shaped describes one region and
//! is wrapped under the implicit slot name `main`. Slot-ness is decided
//! structurally, never by key name.

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::error::{ParseError, Result};
use crate::op::{Op, OpKind};
use crate::registry::{CompoundVariant, VariantGroups};
use crate::tree::{AttrEntry, AttrMap, SlotNode, SlotTree};
use crate::value::Value;

/// Attribute names allowed to hold nested sub-attributes.
pub const NESTED_FIELDS: &[&str] = &["data", "aria"];

/// Raw key marking a deferred placeholder: `{"defer": "<id>"}`.
pub const DEFER_KEY: &str = "defer";

/// Implicit slot name for single-region input.
pub const MAIN_SLOT: &str = "main";

type JsonMap = Map<String, Json>;

// ============================================================================
// Public entry points
// ============================================================================

/// Parses raw input into a canonical slot tree.
///
/// Pure: identical input always yields structurally identical output.
pub fn parse_slot_tree(raw: &Json) -> Result<SlotTree> {
    parse_slot_tree_at(raw, "slots")
}

/// Parses raw variant groups: group name -> option key -> slot tree.
pub fn parse_variants(raw: &Json) -> Result<VariantGroups> {
    parse_variants_at(raw, "variants")
}

/// Parses a raw sequence of compound variants.
pub fn parse_compounds(raw: &Json) -> Result<Vec<CompoundVariant>> {
    parse_compounds_at(raw, "compounds")
}

/// Parses defaults: a flat mapping of group -> option key.
pub fn parse_defaults(raw: &Json) -> Result<IndexMap<String, String>> {
    let map = match raw {
        Json::Object(map) => map,
        other => {
            return Err(ParseError::InvalidDefaults {
                message: format!("expected a mapping, found {}", describe(other)),
            })
        }
    };
    let mut defaults = IndexMap::new();
    for (group, option) in map {
        if !is_scalar(option) {
            return Err(ParseError::InvalidDefaults {
                message: format!(
                    "group '{group}' must map to a plain option key, found {}",
                    describe(option)
                ),
            });
        }
        defaults.insert(group.clone(), stringify(option));
    }
    Ok(defaults)
}

// ============================================================================
// Slot trees
// ============================================================================

pub(crate) fn parse_slot_tree_at(raw: &Json, ctx: &str) -> Result<SlotTree> {
    let map = expect_mapping(raw, ctx)?;
    let mut tree = SlotTree::default();
    if map.is_empty() {
        return Ok(tree);
    }
    if is_single_slot(map) {
        let node = parse_slot_body(map, &format!("{ctx}.{MAIN_SLOT}"))?;
        tree.slots.insert(MAIN_SLOT.to_string(), node);
    } else {
        for (name, value) in map {
            let slot_ctx = format!("{ctx}.{name}");
            let body = expect_mapping(value, &slot_ctx)?;
            tree.slots.insert(name.clone(), parse_slot_body(body, &slot_ctx)?);
        }
    }
    Ok(tree)
}

/// A mapping is a single slot when every value is attribute-shaped: a
/// scalar, a sequence, an operation or defer object, or a nesting field.
fn is_single_slot(map: &JsonMap) -> bool {
    !map.is_empty()
        && map.iter().all(|(key, value)| match value {
            Json::Object(obj) => {
                NESTED_FIELDS.contains(&key.as_str())
                    || is_operation_shaped(obj)
                    || is_defer_object(obj)
            }
            _ => true,
        })
}

fn parse_slot_body(map: &JsonMap, ctx: &str) -> Result<SlotNode> {
    let mut node = SlotNode::default();
    for (key, value) in map {
        let attr_ctx = format!("{ctx}.{key}");
        match value {
            Json::Object(obj) => {
                if is_defer_object(obj) {
                    let placeholder = parse_defer(obj, &attr_ctx)?;
                    node.attrs
                        .insert(key.clone(), AttrEntry::Ops(vec![Op::set(vec![placeholder])]));
                } else if is_operation_shaped(obj) {
                    let op = parse_operation(obj, &attr_ctx)?;
                    node.attrs.insert(key.clone(), AttrEntry::Ops(vec![op]));
                } else if NESTED_FIELDS.contains(&key.as_str()) {
                    let group = parse_attr_group(obj, &attr_ctx)?;
                    node.attrs.insert(key.clone(), AttrEntry::Group(group));
                } else {
                    node.children
                        .insert(key.clone(), parse_slot_body(obj, &attr_ctx)?);
                }
            }
            Json::Array(items) => {
                node.attrs
                    .insert(key.clone(), AttrEntry::Ops(parse_op_log(items, &attr_ctx)?));
            }
            scalar => {
                node.attrs.insert(
                    key.clone(),
                    AttrEntry::Ops(vec![Op::set(vec![Value::Literal(stringify(scalar))])]),
                );
            }
        }
    }
    node.has_deferred = node.attrs.values().any(AttrEntry::has_deferred)
        || node.children.values().any(|child| child.has_deferred);
    Ok(node)
}

/// Parses the body of a nesting-capable field (`data`/`aria`). Same rules
/// as attribute values, except an unrecognized mapping recurses as a
/// sub-group rather than a child region.
fn parse_attr_group(map: &JsonMap, ctx: &str) -> Result<AttrMap> {
    let mut group = AttrMap::new();
    for (key, value) in map {
        let attr_ctx = format!("{ctx}.{key}");
        match value {
            Json::Object(obj) => {
                if is_defer_object(obj) {
                    let placeholder = parse_defer(obj, &attr_ctx)?;
                    group.insert(key.clone(), AttrEntry::Ops(vec![Op::set(vec![placeholder])]));
                } else if is_operation_shaped(obj) {
                    let op = parse_operation(obj, &attr_ctx)?;
                    group.insert(key.clone(), AttrEntry::Ops(vec![op]));
                } else {
                    group.insert(key.clone(), AttrEntry::Group(parse_attr_group(obj, &attr_ctx)?));
                }
            }
            Json::Array(items) => {
                group.insert(key.clone(), AttrEntry::Ops(parse_op_log(items, &attr_ctx)?));
            }
            scalar => {
                group.insert(
                    key.clone(),
                    AttrEntry::Ops(vec![Op::set(vec![Value::Literal(stringify(scalar))])]),
                );
            }
        }
    }
    Ok(group)
}

// ============================================================================
// Operations
// ============================================================================

/// Parses a raw sequence at an attribute position into an operation log.
///
/// A sequence with no operation objects is one `set` of all its items. A
/// sequence containing operation objects is used as the log directly:
/// operation objects are validated, and each consecutive run of plain
/// items folds into a single `set` of the whole run — the same shape an
/// all-plain sequence produces, so no item is discarded by its neighbor.
fn parse_op_log(items: &[Json], ctx: &str) -> Result<Vec<Op>> {
    let has_ops = items
        .iter()
        .any(|item| matches!(item, Json::Object(obj) if is_operation_shaped(obj)));
    if !has_ops {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(parse_value_item(item, ctx)?);
        }
        return Ok(vec![Op::set(values)]);
    }

    let mut ops = Vec::with_capacity(items.len());
    let mut run: Vec<Value> = Vec::new();
    for item in items {
        match item {
            Json::Object(obj) if is_operation_shaped(obj) => {
                if !run.is_empty() {
                    ops.push(Op::set(std::mem::take(&mut run)));
                }
                ops.push(parse_operation(obj, ctx)?);
            }
            Json::Object(obj) if is_defer_object(obj) => {
                run.push(parse_defer(obj, ctx)?);
            }
            Json::Object(_) => {
                return Err(ParseError::InvalidOperation {
                    context: ctx.to_string(),
                    kinds: "none".to_string(),
                });
            }
            Json::Array(_) => {
                return Err(ParseError::InvalidStructure {
                    context: ctx.to_string(),
                    found: "a sequence nested inside an operation log".to_string(),
                });
            }
            scalar => {
                run.push(Value::Literal(stringify(scalar)));
            }
        }
    }
    if !run.is_empty() {
        ops.push(Op::set(run));
    }
    Ok(ops)
}

/// Parses one operation object. Exactly one operation kind is required;
/// more than one is `InvalidOperation`.
fn parse_operation(map: &JsonMap, ctx: &str) -> Result<Op> {
    if map.len() != 1 {
        let kinds = if map.is_empty() {
            "none".to_string()
        } else {
            map.keys()
                .filter_map(|key| OpKind::from_key(key))
                .map(OpKind::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        return Err(ParseError::InvalidOperation {
            context: ctx.to_string(),
            kinds,
        });
    }
    let mut entries = map.iter();
    let (key, raw_values) = match entries.next() {
        Some(entry) => entry,
        None => {
            return Err(ParseError::InvalidOperation {
                context: ctx.to_string(),
                kinds: "none".to_string(),
            })
        }
    };
    let kind = match OpKind::from_key(key) {
        Some(kind) => kind,
        None => {
            return Err(ParseError::InvalidOperation {
                context: ctx.to_string(),
                kinds: key.clone(),
            })
        }
    };
    Ok(Op::new(kind, parse_op_values(raw_values, ctx)?))
}

/// Parses the value side of an operation: a scalar is one item, a sequence
/// contributes its items in order, a defer object is one placeholder.
fn parse_op_values(raw: &Json, ctx: &str) -> Result<Vec<Value>> {
    match raw {
        Json::Array(items) => items.iter().map(|item| parse_value_item(item, ctx)).collect(),
        Json::Object(obj) if is_defer_object(obj) => Ok(vec![parse_defer(obj, ctx)?]),
        Json::Object(other) => Err(ParseError::InvalidStructure {
            context: ctx.to_string(),
            found: format!(
                "a mapping with keys [{}] inside operation values",
                other.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        }),
        scalar => Ok(vec![Value::Literal(stringify(scalar))]),
    }
}

fn parse_value_item(raw: &Json, ctx: &str) -> Result<Value> {
    match raw {
        Json::Object(obj) if is_defer_object(obj) => parse_defer(obj, ctx),
        Json::Object(_) | Json::Array(_) => Err(ParseError::InvalidStructure {
            context: ctx.to_string(),
            found: format!("{} where a plain value is required", describe(raw)),
        }),
        scalar => Ok(Value::Literal(stringify(scalar))),
    }
}

fn is_operation_shaped(map: &JsonMap) -> bool {
    !map.is_empty() && map.keys().all(|key| OpKind::from_key(key).is_some())
}

fn is_defer_object(map: &JsonMap) -> bool {
    map.len() == 1 && map.contains_key(DEFER_KEY)
}

fn parse_defer(map: &JsonMap, ctx: &str) -> Result<Value> {
    match &map[DEFER_KEY] {
        Json::String(id) => Ok(Value::Deferred(id.clone())),
        other => Err(ParseError::InvalidStructure {
            context: ctx.to_string(),
            found: format!("deferred placeholder id must be a string, found {}", describe(other)),
        }),
    }
}

// ============================================================================
// Variants, compounds
// ============================================================================

pub(crate) fn parse_variants_at(raw: &Json, ctx: &str) -> Result<VariantGroups> {
    let map = expect_mapping(raw, ctx)?;
    let mut groups = VariantGroups::new();
    for (group, options_raw) in map {
        let group_ctx = format!("{ctx}.{group}");
        let options_map = expect_mapping(options_raw, &group_ctx)?;
        let mut options = IndexMap::new();
        for (option, tree_raw) in options_map {
            let option_ctx = format!("{group_ctx}.{option}");
            options.insert(option.clone(), parse_slot_tree_at(tree_raw, &option_ctx)?);
        }
        groups.insert(group.clone(), options);
    }
    Ok(groups)
}

pub(crate) fn parse_compounds_at(raw: &Json, ctx: &str) -> Result<Vec<CompoundVariant>> {
    let items = match raw {
        Json::Array(items) => items,
        other => {
            return Err(ParseError::InvalidStructure {
                context: ctx.to_string(),
                found: format!("expected a sequence, found {}", describe(other)),
            })
        }
    };
    let mut compounds = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_ctx = format!("{ctx}[{index}]");
        let map = expect_mapping(item, &item_ctx)?;
        let mut when = IndexMap::new();
        let mut apply = SlotTree::default();
        let mut saw_when = false;
        for (key, value) in map {
            match key.as_str() {
                "when" => {
                    saw_when = true;
                    let conditions = expect_mapping(value, &format!("{item_ctx}.when"))?;
                    for (group, option) in conditions {
                        if !is_scalar(option) {
                            return Err(ParseError::InvalidVariantCondition {
                                group: group.clone(),
                            });
                        }
                        when.insert(group.clone(), stringify(option));
                    }
                }
                "apply" => {
                    apply = parse_slot_tree_at(value, &format!("{item_ctx}.apply"))?;
                }
                other => {
                    return Err(ParseError::InvalidStructure {
                        context: item_ctx.clone(),
                        found: format!("unexpected key '{other}' in compound variant"),
                    })
                }
            }
        }
        if !saw_when {
            return Err(ParseError::InvalidStructure {
                context: item_ctx,
                found: "missing required key 'when'".to_string(),
            });
        }
        compounds.push(CompoundVariant { when, apply });
    }
    Ok(compounds)
}

// ============================================================================
// Shared helpers
// ============================================================================

fn expect_mapping<'a>(value: &'a Json, ctx: &str) -> Result<&'a JsonMap> {
    match value {
        Json::Object(map) => Ok(map),
        other => Err(ParseError::InvalidStructure {
            context: ctx.to_string(),
            found: format!("expected a mapping, found {}", describe(other)),
        }),
    }
}

fn is_scalar(value: &Json) -> bool {
    matches!(
        value,
        Json::Null | Json::Bool(_) | Json::Number(_) | Json::String(_)
    )
}

/// Stringifies a scalar at parse time. `null` becomes the empty string.
fn stringify(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n.to_string(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn describe(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "a sequence",
        Json::Object(_) => "a mapping",
    }
}
