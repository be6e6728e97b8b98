//! The variant registry: configuration storage, selection, and memoization.
//!
//! A registry is constructed once per configuration owner and then read
//! concurrently by many callers. All structural validation happens at
//! construction; [`VariantRegistry::resolve`] can only fail when per-call
//! adjustments themselves fail to parse.
//!
//! # Resolution order
//!
//! On a cache miss, partial trees merge onto a copy of the base in a fixed
//! order: default-declared groups first (in declaration order), then groups
//! present only in the caller's selection (in call order), then every
//! matching compound variant (in declaration order), then the per-call
//! adjustments. Matching operation logs concatenate, so later sources
//! always execute after earlier ones.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use log::debug;
use serde_json::Value as Json;

use crate::error::{ParseError, Result};
use crate::parse;
use crate::resolved::ResolvedSet;
use crate::select::Selection;
use crate::tree::SlotTree;

/// Parsed variant groups: group name -> option key -> partial tree.
pub type VariantGroups = IndexMap<String, IndexMap<String, SlotTree>>;

/// A partial configuration applied only when every condition in `when`
/// matches the effective selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundVariant {
    pub when: IndexMap<String, String>,
    pub apply: SlotTree,
}

impl CompoundVariant {
    fn matches(&self, effective: &IndexMap<String, String>) -> bool {
        self.when
            .iter()
            .all(|(group, option)| effective.get(group) == Some(option))
    }
}

/// Owns a parsed variant configuration and resolves selections against it.
#[derive(Debug, Default)]
pub struct VariantRegistry {
    base: SlotTree,
    variants: VariantGroups,
    compounds: Vec<CompoundVariant>,
    defaults: IndexMap<String, String>,
    cache: RwLock<HashMap<String, Arc<ResolvedSet>>>,
}

impl VariantRegistry {
    /// Creates an empty registry; populate it with the setters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a raw config mapping with optional `base`,
    /// `variants`, `compounds` and `defaults` keys.
    pub fn from_value(raw: &Json) -> Result<Self> {
        let map = match raw {
            Json::Object(map) => map,
            other => {
                return Err(ParseError::InvalidStructure {
                    context: "config".to_string(),
                    found: format!("expected a mapping, found {}", parse::describe(other)),
                })
            }
        };
        let mut registry = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "base" => registry.base = parse::parse_slot_tree_at(value, "base")?,
                "variants" => registry.variants = parse::parse_variants_at(value, "variants")?,
                "compounds" => registry.compounds = parse::parse_compounds_at(value, "compounds")?,
                "defaults" => registry.defaults = parse::parse_defaults(value)?,
                other => {
                    return Err(ParseError::InvalidStructure {
                        context: "config".to_string(),
                        found: format!("unknown key '{other}'"),
                    })
                }
            }
        }
        debug!(
            "registry configured: {} variant group(s), {} compound(s), {} default(s)",
            registry.variants.len(),
            registry.compounds.len(),
            registry.defaults.len()
        );
        Ok(registry)
    }

    /// Builds a registry from a JSON config document.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Json = serde_json::from_str(text).map_err(|e| ParseError::InvalidDocument {
            format: "json",
            message: e.to_string(),
        })?;
        Self::from_value(&raw)
    }

    /// Builds a registry from a YAML config document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| ParseError::InvalidDocument {
                format: "yaml",
                message: e.to_string(),
            })?;
        let raw = serde_json::to_value(doc).map_err(|e| ParseError::InvalidDocument {
            format: "yaml",
            message: e.to_string(),
        })?;
        Self::from_value(&raw)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replaces the base tree wholesale, re-parsing the raw input and
    /// clearing the cache.
    pub fn set_base(&mut self, raw: &Json) -> Result<()> {
        self.base = parse::parse_slot_tree_at(raw, "base")?;
        self.invalidate();
        Ok(())
    }

    /// Replaces all variant groups; clears the cache.
    pub fn set_variants(&mut self, raw: &Json) -> Result<()> {
        self.variants = parse::parse_variants_at(raw, "variants")?;
        self.invalidate();
        Ok(())
    }

    /// Replaces all compound variants; clears the cache.
    pub fn set_compounds(&mut self, raw: &Json) -> Result<()> {
        self.compounds = parse::parse_compounds_at(raw, "compounds")?;
        self.invalidate();
        Ok(())
    }

    /// Replaces the defaults; clears the cache.
    pub fn set_defaults(&mut self, raw: &Json) -> Result<()> {
        self.defaults = parse::parse_defaults(raw)?;
        self.invalidate();
        Ok(())
    }

    pub fn base(&self) -> &SlotTree {
        &self.base
    }

    pub fn variants(&self) -> &VariantGroups {
        &self.variants
    }

    pub fn compounds(&self) -> &[CompoundVariant] {
        &self.compounds
    }

    pub fn defaults(&self) -> &IndexMap<String, String> {
        &self.defaults
    }

    fn invalidate(&self) {
        self.cache.write().unwrap().clear();
        debug!("registry configuration changed, cache cleared");
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves a selection into an executed tree, memoized per effective
    /// selection. Unknown groups and options are silently ignored.
    pub fn resolve(&self, selection: &Selection) -> Result<Arc<ResolvedSet>> {
        self.resolve_adjusted(selection, &Json::Null)
    }

    /// Like [`resolve`](Self::resolve), with per-call raw adjustments
    /// merged last. Adjustments are the one input parsed at fetch time, so
    /// parse errors for them surface here.
    pub fn resolve_adjusted(&self, selection: &Selection, adjust: &Json) -> Result<Arc<ResolvedSet>> {
        let effective = self.effective_selection(selection);
        let key = cache_key(&effective, adjust);

        if let Some(hit) = self.cache.read().unwrap().get(&key) {
            debug!("cache hit for [{key}]");
            return Ok(Arc::clone(hit));
        }
        debug!("cache miss for [{key}], resolving");

        let adjust_tree = if adjust_is_empty(adjust) {
            None
        } else {
            Some(parse::parse_slot_tree_at(adjust, "adjust")?)
        };

        let mut tree = self.base.clone();
        for (group, option) in &effective {
            if let Some(partial) = self
                .variants
                .get(group)
                .and_then(|options| options.get(option))
            {
                tree.merge_from(partial);
            }
        }
        for compound in &self.compounds {
            if compound.matches(&effective) {
                tree.merge_from(&compound.apply);
            }
        }
        if let Some(adjustments) = &adjust_tree {
            tree.merge_from(adjustments);
        }

        let resolved = Arc::new(ResolvedSet::from_tree(&tree));
        // Concurrent misses may compute the same entry twice; resolution is
        // deterministic, so last writer wins harmlessly.
        self.cache
            .write()
            .unwrap()
            .insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Defaults first in declaration order, then the caller's selection:
    /// groups already present keep their position, new groups append.
    fn effective_selection(&self, selection: &Selection) -> IndexMap<String, String> {
        let mut effective = self.defaults.clone();
        for (group, option) in selection.iter() {
            effective.insert(group.to_string(), option.to_string());
        }
        effective
    }

    /// Creates an independent copy of this registry with a fresh, empty
    /// cache. This is the explicit inheritance point for hierarchical
    /// configuration reuse.
    pub fn derive(&self) -> VariantRegistry {
        VariantRegistry {
            base: self.base.clone(),
            variants: self.variants.clone(),
            compounds: self.compounds.clone(),
            defaults: self.defaults.clone(),
            cache: RwLock::new(HashMap::new()),
        }
    }
}

fn adjust_is_empty(adjust: &Json) -> bool {
    match adjust {
        Json::Null => true,
        Json::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Stable serialization of the effective selection plus adjustments: a
/// two-element JSON document, so group and option strings containing any
/// delimiter characters cannot collide across entries or segments. Empty
/// adjustments normalize to the same key as none at all.
fn cache_key(effective: &IndexMap<String, String>, adjust: &Json) -> String {
    let mut selection = serde_json::Map::new();
    for (group, option) in effective {
        selection.insert(group.clone(), Json::String(option.clone()));
    }
    let adjust = if adjust_is_empty(adjust) {
        Json::Null
    } else {
        adjust.clone()
    };
    Json::Array(vec![Json::Object(selection), adjust]).to_string()
}
