// ==============================================================================
// Rename Maps
// ==============================================================================
//
// A rename map assigns canonical names in first-occurrence order: the first
// distinct original name seen gets index 0, the next new one index 1, and so
// on. Looking up a name that was already seen returns the name it got the
// first time, so the map is a bijection between the originals seen so far and
// a prefix of the canonical sequence.
//
// Each canonicalization pass builds its own map from scratch. Maps are never
// shared between passes, between the two files of a pair, or across pairs.

use indexmap::IndexMap;

/// How canonical names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScheme {
    /// `id0`, `id1`, ..., `id10`, ...
    Identifier,
    /// `func0`, ..., `func9`, `funca`, ..., `func10`, ... (lowercase hex)
    Function,
}

impl NameScheme {
    pub fn name(self, index: usize) -> String {
        match self {
            NameScheme::Identifier => format!("id{index}"),
            NameScheme::Function => format!("func{index:x}"),
        }
    }
}

/// The canonical name for the parameter in position `index`. Parameters are
/// named by position alone and never go through a rename map.
pub fn parameter_name(index: usize) -> String {
    format!("arg{index}")
}

#[derive(Debug, Clone)]
pub struct RenameMap {
    scheme: NameScheme,
    names: IndexMap<String, String>,
}

impl RenameMap {
    pub fn new(scheme: NameScheme) -> Self {
        RenameMap {
            scheme,
            names: IndexMap::new(),
        }
    }

    pub fn identifiers() -> Self {
        RenameMap::new(NameScheme::Identifier)
    }

    pub fn functions() -> Self {
        RenameMap::new(NameScheme::Function)
    }

    /// The canonical name for `original`, allocating the next one on first
    /// sight.
    pub fn canonical(&mut self, original: &str) -> String {
        if let Some(name) = self.names.get(original) {
            return name.clone();
        }
        let name = self.scheme.name(self.names.len());
        self.names.insert(original.to_string(), name.clone());
        name
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.names.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(original, canonical)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_are_allocated_in_first_occurrence_order() {
        let mut map = RenameMap::identifiers();
        assert_eq!(map.canonical("total"), "id0");
        assert_eq!(map.canonical("i"), "id1");
        assert_eq!(map.canonical("total"), "id0");
        assert_eq!(map.canonical("xs"), "id2");
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            [("total", "id0"), ("i", "id1"), ("xs", "id2")]
        );
    }

    #[test]
    fn function_names_use_lowercase_hex() {
        let mut map = RenameMap::functions();
        let names: Vec<String> = (0..17).map(|i| map.canonical(&format!("f{i}"))).collect();
        assert_eq!(names[9], "func9");
        assert_eq!(names[10], "funca");
        assert_eq!(names[15], "funcf");
        assert_eq!(names[16], "func10");
    }

    #[test]
    fn lookup_does_not_allocate() {
        let mut map = RenameMap::identifiers();
        assert_eq!(map.get("x"), None);
        assert!(map.is_empty());
        map.canonical("x");
        assert_eq!(map.get("x"), Some("id0"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn mapping_is_injective() {
        let mut map = RenameMap::identifiers();
        for name in ["a", "b", "a", "c", "b", "d"] {
            map.canonical(name);
        }
        let mut canonical: Vec<&str> = map.iter().map(|(_, c)| c).collect();
        canonical.sort_unstable();
        canonical.dedup();
        assert_eq!(canonical.len(), map.len());
    }

    #[test]
    fn parameters_are_positional() {
        assert_eq!(parameter_name(0), "arg0");
        assert_eq!(parameter_name(12), "arg12");
    }
}
