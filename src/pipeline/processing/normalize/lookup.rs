use std::collections::{BTreeMap, HashMap};

/// Case-insensitive map from raw text variants to canonical values.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: HashMap<String, String>,
}

impl LookupTable {
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let entries = map
            .iter()
            .map(|(variant, canonical)| (variant.trim().to_lowercase(), canonical.clone()))
            .collect();
        Self { entries }
    }

    /// Canonical value for `raw`, if the table knows it
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.entries
            .get(&raw.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case_and_padding() {
        let mut map = BTreeMap::new();
        map.insert("U.S.A.".to_string(), "United States".to_string());
        let table = LookupTable::from_map(&map);

        assert_eq!(table.lookup("u.s.a."), Some("United States"));
        assert_eq!(table.lookup("  U.S.A. "), Some("United States"));
        assert_eq!(table.lookup("canada"), None);
        assert_eq!(table.len(), 1);
    }
}
