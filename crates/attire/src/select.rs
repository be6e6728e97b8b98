//! Caller-supplied variant selections.

use indexmap::IndexMap;

/// An ordered set of `group -> option` choices supplied per fetch.
///
/// Order matters: when a selection is overlaid on the registry defaults,
/// groups already present in the defaults keep the defaults' position and
/// groups only present here append in call order. That combined order is
/// the canonical merge order for variant partials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    choices: IndexMap<String, String>,
}

impl Selection {
    /// Creates an empty selection (defaults alone decide the outcome).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style choice; replaces any earlier choice for the group.
    pub fn with(mut self, group: impl Into<String>, option: impl Into<String>) -> Self {
        self.choices.insert(group.into(), option.into());
        self
    }

    /// Records a choice in place.
    pub fn choose(&mut self, group: impl Into<String>, option: impl Into<String>) {
        self.choices.insert(group.into(), option.into());
    }

    /// Returns the chosen option for a group, if any.
    pub fn get(&self, group: &str) -> Option<&str> {
        self.choices.get(group).map(String::as_str)
    }

    /// Iterates choices in call order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.choices
            .iter()
            .map(|(group, option)| (group.as_str(), option.as_str()))
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

impl<G: Into<String>, O: Into<String>> FromIterator<(G, O)> for Selection {
    fn from_iter<I: IntoIterator<Item = (G, O)>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for (group, option) in iter {
            selection.choose(group, option);
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_call_order() {
        let selection = Selection::new()
            .with("size", "sm")
            .with("color", "primary");
        let groups: Vec<&str> = selection.iter().map(|(g, _)| g).collect();
        assert_eq!(groups, vec!["size", "color"]);
    }

    #[test]
    fn later_choice_replaces_earlier() {
        let selection = Selection::new().with("color", "primary").with("color", "danger");
        assert_eq!(selection.get("color"), Some("danger"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn from_iterator_of_pairs() {
        let selection: Selection = [("color", "primary"), ("size", "lg")].into_iter().collect();
        assert_eq!(selection.get("size"), Some("lg"));
        assert_eq!(selection.len(), 2);
    }
}
