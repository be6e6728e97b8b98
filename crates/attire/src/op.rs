//! Attribute operations and operation-log execution.
//!
//! Every attribute leaf in a parsed tree is an ordered log of operations.
//! Merging configuration sources concatenates logs; [`run_ops`] executes a
//! log left to right to produce the final item sequence.

use crate::value::Value;

/// The four operation kinds recognized in raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Replace the accumulated sequence entirely.
    Set,
    /// Concatenate values at the end.
    Append,
    /// Concatenate values at the front.
    Prepend,
    /// Remove all matching items, preserving remaining order.
    Remove,
}

impl OpKind {
    /// Maps a raw mapping key to its operation kind.
    pub fn from_key(key: &str) -> Option<OpKind> {
        match key {
            "set" => Some(OpKind::Set),
            "append" => Some(OpKind::Append),
            "prepend" => Some(OpKind::Prepend),
            "remove" => Some(OpKind::Remove),
            _ => None,
        }
    }

    /// Returns the raw key for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Set => "set",
            OpKind::Append => "append",
            OpKind::Prepend => "prepend",
            OpKind::Remove => "remove",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One instruction in an attribute's operation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    pub kind: OpKind,
    pub values: Vec<Value>,
}

impl Op {
    pub fn new(kind: OpKind, values: Vec<Value>) -> Self {
        Op { kind, values }
    }

    /// Shorthand for the `set` operation the normalizer emits for plain
    /// scalar and sequence input.
    pub fn set(values: Vec<Value>) -> Self {
        Op::new(OpKind::Set, values)
    }

    /// Returns `true` if any value is a deferred placeholder.
    pub fn has_deferred(&self) -> bool {
        self.values.iter().any(Value::is_deferred)
    }
}

/// Executes an operation log left to right, starting from an empty sequence.
///
/// Execution always starts from empty: logs that do not end in `set` are not
/// idempotent against an arbitrary starting sequence, so results are never
/// computed incrementally. An empty log yields an empty sequence.
pub fn run_ops(ops: &[Op]) -> Vec<Value> {
    let mut current: Vec<Value> = Vec::new();
    for op in ops {
        match op.kind {
            OpKind::Set => {
                current = op.values.clone();
            }
            OpKind::Append => {
                current.extend(op.values.iter().cloned());
            }
            OpKind::Prepend => {
                let mut front = op.values.clone();
                front.extend(current);
                current = front;
            }
            OpKind::Remove => {
                current.retain(|item| !op.values.contains(item));
            }
        }
    }
    current
}
