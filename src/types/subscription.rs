//! Subscribed bus-stop identifiers

use std::collections::HashSet;

/// Ordered stop identifiers for one coordinator.
///
/// Parsing is the single place where identifiers are case-folded; every
/// other component compares them as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionList {
    entries: Vec<String>,
}

impl SubscriptionList {
    /// Parse a comma-separated list: entries are trimmed and uppercased,
    /// empty entries dropped. Duplicates are kept here.
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { entries }
    }

    /// Entries as configured, duplicates included
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Order-preserving deduplicated identifiers
    pub fn unique(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let list = SubscriptionList::parse("pa433, pa433 , PB10");
        assert_eq!(list.entries(), ["PA433", "PA433", "PB10"]);
    }

    #[test]
    fn test_unique_preserves_order() {
        let list = SubscriptionList::parse("pa433, pa433 , PB10");
        assert_eq!(list.unique(), vec!["PA433".to_string(), "PB10".to_string()]);
    }

    #[test]
    fn test_parse_drops_empty_entries() {
        let list = SubscriptionList::parse(" , PA433,,  ,pc1,");
        assert_eq!(list.entries(), ["PA433", "PC1"]);
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(SubscriptionList::parse("").is_empty());
        assert!(SubscriptionList::parse(" ,  , ").is_empty());
    }
}
