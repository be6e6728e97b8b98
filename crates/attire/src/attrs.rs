//! Final concrete attribute values handed to the renderer.
//!
//! An [`AttrSet`] is produced per fetch by evaluating a cached resolved
//! tree against the caller's context. It contains only plain strings (and
//! nested groups of strings), serializes directly, and is discarded after
//! use.

use indexmap::IndexMap;
use serde::Serialize;

/// A final attribute value: joined text, or a nested group for
/// nesting-capable fields such as `data`/`aria`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Group(IndexMap<String, AttrValue>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            AttrValue::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&IndexMap<String, AttrValue>> {
        match self {
            AttrValue::Text(_) => None,
            AttrValue::Group(group) => Some(group),
        }
    }
}

/// Concrete attributes for one slot, plus any nested child slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotAttrs {
    pub attrs: IndexMap<String, AttrValue>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, SlotAttrs>,
}

impl SlotAttrs {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Returns the attribute's text, or `None` when absent or a group.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_text)
    }

    pub fn child(&self, name: &str) -> Option<&SlotAttrs> {
        self.children.get(name)
    }
}

/// The per-fetch product: every slot evaluated to concrete strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttrSet {
    slots: IndexMap<String, SlotAttrs>,
}

impl AttrSet {
    pub(crate) fn new(slots: IndexMap<String, SlotAttrs>) -> Self {
        AttrSet { slots }
    }

    pub fn slots(&self) -> &IndexMap<String, SlotAttrs> {
        &self.slots
    }

    pub fn get(&self, name: &str) -> Option<&SlotAttrs> {
        self.slots.get(name)
    }

    /// The implicit slot single-region input collapses into.
    pub fn main(&self) -> Option<&SlotAttrs> {
        self.get("main")
    }

    /// Narrows to a nested slot path. `None` when any element is absent.
    pub fn dig(&self, path: &[&str]) -> Option<&SlotAttrs> {
        let (first, rest) = path.split_first()?;
        let mut slot = self.slots.get(*first)?;
        for name in rest {
            slot = slot.children.get(*name)?;
        }
        Some(slot)
    }
}
