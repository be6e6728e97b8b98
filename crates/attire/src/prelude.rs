//! Convenience re-exports for the common path: build a registry, resolve a
//! selection, evaluate against a context.

pub use crate::{
    AttrSet, AttrValue, DeferredSource, EvalContext, ParseError, ResolvedSet, Selection,
    VariantRegistry,
};
