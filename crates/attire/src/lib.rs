//! Attire - variant-driven attribute resolution for component slot trees.
//!
//! Attire resolves a declarative variant configuration — a base attribute
//! set, named variant groups, compound (multi-condition) variants, and
//! defaults — into concrete attribute values for one or more named slots,
//! given a per-call selection and optional ad-hoc adjustments. It is the
//! engine behind conditional CSS class assembly: deterministic,
//! operation-ordered merging of partial configurations over nested
//! component regions.
//!
//! # Quick Start
//!
//! ```rust
//! use attire::{Selection, VariantRegistry};
//! use serde_json::json;
//!
//! let registry = VariantRegistry::from_value(&json!({
//!     "base": { "class": ["btn"] },
//!     "variants": {
//!         "color": {
//!             "primary": { "class": { "append": ["btn-primary"] } },
//!             "danger": { "class": { "append": ["btn-danger"] } }
//!         },
//!         "size": {
//!             "lg": { "class": { "append": ["btn-lg"] } }
//!         }
//!     },
//!     "compounds": [
//!         {
//!             "when": { "color": "danger", "size": "lg" },
//!             "apply": { "class": { "append": ["btn-alarm"] } }
//!         }
//!     ],
//!     "defaults": { "color": "primary" }
//! })).unwrap();
//!
//! // Defaults alone:
//! let resolved = registry.resolve(&Selection::new()).unwrap();
//! let attrs = resolved.evaluate(&());
//! assert_eq!(attrs.main().unwrap().text("class"), Some("btn btn-primary"));
//!
//! // A selection that triggers the compound:
//! let selection = Selection::new().with("color", "danger").with("size", "lg");
//! let resolved = registry.resolve(&selection).unwrap();
//! let attrs = resolved.evaluate(&());
//! assert_eq!(
//!     attrs.main().unwrap().text("class"),
//!     Some("btn btn-danger btn-lg btn-alarm")
//! );
//! ```
//!
//! # How resolution works
//!
//! 1. Every configuration source (base, each variant option, each compound
//!    payload, per-call adjustments) is normalized into the same canonical
//!    shape: a tree of named slots whose attribute leaves are ordered
//!    operation logs (`set`/`append`/`prepend`/`remove`).
//! 2. On each [`VariantRegistry::resolve`] call, the effective selection is
//!    computed (defaults first, caller's choices overlaid), and matching
//!    partial trees deep-merge onto a copy of the base in canonical order.
//!    Merging concatenates operation logs; it never reorders or drops
//!    operations.
//! 3. Each attribute's log executes left to right from an empty sequence.
//!    The executed tree is memoized per effective selection.
//! 4. Deferred placeholders (`{"defer": "<id>"}` in raw input) survive
//!    caching untouched and are substituted per fetch by
//!    [`ResolvedSet::evaluate`] against a caller [`DeferredSource`].
//!
//! # Deferred values
//!
//! ```rust
//! use attire::{EvalContext, Selection, VariantRegistry};
//! use serde_json::json;
//!
//! let registry = VariantRegistry::from_value(&json!({
//!     "base": { "id": { "defer": "instance_id" }, "class": ["widget"] }
//! })).unwrap();
//!
//! let resolved = registry.resolve(&Selection::new()).unwrap();
//! let ctx = EvalContext::new().bind("instance_id", || "widget-7".to_string());
//! assert_eq!(resolved.evaluate(&ctx).main().unwrap().text("id"), Some("widget-7"));
//! ```
//!
//! Structural errors (malformed operations, non-flat conditions, bad
//! defaults) all surface at construction; a successfully built registry
//! never fails resolution for structural reasons. Unknown groups or options
//! in a selection are silently ignored.

mod attrs;
mod context;
mod error;
mod op;
mod parse;
mod registry;
mod resolved;
mod select;
mod tree;
mod value;

pub mod prelude;

pub use attrs::{AttrSet, AttrValue, SlotAttrs};
pub use context::{DeferredSource, EvalContext};
pub use error::{ParseError, Result};
pub use op::{run_ops, Op, OpKind};
pub use parse::{parse_compounds, parse_defaults, parse_slot_tree, parse_variants};
pub use registry::{CompoundVariant, VariantGroups, VariantRegistry};
pub use resolved::{ResolvedSet, ResolvedSlot, ResolvedValue};
pub use select::Selection;
pub use tree::{merge_attrs, AttrEntry, AttrMap, SlotNode, SlotTree};
pub use value::Value;
