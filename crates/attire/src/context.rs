//! Evaluation contexts for deferred values.

use std::collections::HashMap;

use indexmap::IndexMap;

/// Supplies concrete strings for deferred placeholder ids at fetch time.
///
/// Implementations run on every evaluation, so the same cached resolved
/// tree can produce different output under different contexts. Returning
/// `None` drops the placeholder from its value sequence.
pub trait DeferredSource {
    /// Returns the value bound to `id`, or `None` when unbound.
    fn deferred_value(&self, id: &str) -> Option<String>;
}

/// A closure table: placeholder id to computation.
///
/// This is the usual context for callers binding live values (a current
/// timestamp, an instance attribute) to ids referenced from configuration.
///
/// ```rust
/// use attire::{DeferredSource, EvalContext};
///
/// let ctx = EvalContext::new().bind("instance_id", || "widget-7".to_string());
/// assert_eq!(ctx.deferred_value("instance_id"), Some("widget-7".to_string()));
/// assert_eq!(ctx.deferred_value("missing"), None);
/// ```
#[derive(Default)]
pub struct EvalContext {
    bindings: IndexMap<String, Box<dyn Fn() -> String>>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `id` to a computation, replacing any previous binding.
    pub fn bind(mut self, id: impl Into<String>, f: impl Fn() -> String + 'static) -> Self {
        self.bindings.insert(id.into(), Box::new(f));
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DeferredSource for EvalContext {
    fn deferred_value(&self, id: &str) -> Option<String> {
        self.bindings.get(id).map(|compute| compute())
    }
}

/// The empty context: every placeholder is unbound and dropped.
impl DeferredSource for () {
    fn deferred_value(&self, _id: &str) -> Option<String> {
        None
    }
}

impl DeferredSource for HashMap<String, String> {
    fn deferred_value(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

impl DeferredSource for IndexMap<String, String> {
    fn deferred_value(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_run_per_lookup() {
        use std::cell::Cell;
        use std::rc::Rc;

        let counter = Rc::new(Cell::new(0));
        let seen = Rc::clone(&counter);
        let ctx = EvalContext::new().bind("n", move || {
            seen.set(seen.get() + 1);
            seen.get().to_string()
        });

        assert_eq!(ctx.deferred_value("n"), Some("1".to_string()));
        assert_eq!(ctx.deferred_value("n"), Some("2".to_string()));
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn rebinding_replaces() {
        let ctx = EvalContext::new()
            .bind("x", || "old".to_string())
            .bind("x", || "new".to_string());
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.deferred_value("x"), Some("new".to_string()));
    }

    #[test]
    fn unit_context_is_always_unbound() {
        assert_eq!(().deferred_value("anything"), None);
    }

    #[test]
    fn plain_maps_are_sources() {
        let mut map = HashMap::new();
        map.insert("id".to_string(), "42".to_string());
        assert_eq!(map.deferred_value("id"), Some("42".to_string()));
        assert_eq!(map.deferred_value("other"), None);
    }
}
