//! Leaf values carried by attribute operations.

/// A single item inside an operation's value list.
///
/// Most values are literal strings, fixed at parse time. A
/// [`Value::Deferred`] is a placeholder for a computation that only happens
/// at fetch time: its id is looked up in the caller's
/// [`DeferredSource`](crate::DeferredSource) when a resolved tree is
/// evaluated — never earlier, and never from the cache.
///
/// Keeping the placeholder as a plain id (rather than storing a closure in
/// the tree) keeps the data model serializable and comparable; the closures
/// live in the evaluation context supplied per fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A concrete string.
    Literal(String),
    /// A placeholder resolved against the evaluation context on every fetch.
    Deferred(String),
}

impl Value {
    /// Creates a literal value from anything string-like.
    pub fn literal(s: impl Into<String>) -> Self {
        Value::Literal(s.into())
    }

    /// Creates a deferred placeholder with the given binding id.
    pub fn deferred(id: impl Into<String>) -> Self {
        Value::Deferred(id.into())
    }

    /// Returns `true` for [`Value::Deferred`].
    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    /// Returns the literal string, or `None` for deferred placeholders.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Value::Literal(s) => Some(s),
            Value::Deferred(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Literal(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Literal(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_accessors() {
        let v = Value::literal("btn");
        assert!(!v.is_deferred());
        assert_eq!(v.as_literal(), Some("btn"));
    }

    #[test]
    fn deferred_accessors() {
        let v = Value::deferred("timestamp");
        assert!(v.is_deferred());
        assert_eq!(v.as_literal(), None);
    }

    #[test]
    fn from_str_is_literal() {
        assert_eq!(Value::from("x"), Value::Literal("x".to_string()));
    }
}
