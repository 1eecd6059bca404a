//! Symbol table mapping filter abbreviations to field identifiers.

use std::collections::BTreeMap;

use compact_str::CompactString;

use super::{FieldId, FieldRegistry};

/// Ordered abbreviation lookup table, built once at startup.
///
/// Keys compare byte-wise; there is no case folding. A failed lookup means
/// "not a field reference", not an error. The parser decides whether an
/// unresolved name is then a syntax error.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<CompactString, FieldId>,
}

impl SymbolTable {
    /// Build the table from every registered field with a non-empty
    /// abbreviation. Duplicate abbreviations keep the latest registration.
    pub fn build(registry: &FieldRegistry) -> Self {
        let mut symbols = BTreeMap::new();
        for id in registry.ids() {
            if let Some(abbrev) = registry.abbreviation(id) {
                symbols.insert(CompactString::new(abbrev), id);
            }
        }
        tracing::debug!(symbols = symbols.len(), "built filter symbol table");
        Self { symbols }
    }

    /// Exact-match lookup of a filter abbreviation.
    pub fn lookup(&self, abbrev: &str) -> Option<FieldId> {
        self.symbols.get(abbrev).copied()
    }

    /// Number of resolvable abbreviations.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    fn sample_registry() -> (FieldRegistry, FieldId, FieldId) {
        let mut registry = FieldRegistry::new();
        let ip = registry.register_protocol("Internet Protocol", "ip");
        let ttl = registry.register_field("Time to live", "ip.ttl", FieldType::Numeric, ip);
        (registry, ip, ttl)
    }

    #[test]
    fn test_lookup_registered_abbreviations() {
        let (registry, ip, ttl) = sample_registry();
        let symbols = SymbolTable::build(&registry);

        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols.lookup("ip"), Some(ip));
        assert_eq!(symbols.lookup("ip.ttl"), Some(ttl));
    }

    #[test]
    fn test_lookup_unknown_is_none() {
        let (registry, _, _) = sample_registry();
        let symbols = SymbolTable::build(&registry);

        assert_eq!(symbols.lookup("nosuch.field"), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let (registry, _, _) = sample_registry();
        let symbols = SymbolTable::build(&registry);

        assert_eq!(symbols.lookup("IP"), None);
        assert_eq!(symbols.lookup("Ip.Ttl"), None);
    }

    #[test]
    fn test_empty_abbreviation_not_inserted() {
        let mut registry = FieldRegistry::new();
        let ip = registry.register_protocol("Internet Protocol", "ip");
        registry.register_field("Internal", "", FieldType::Numeric, ip);

        let symbols = SymbolTable::build(&registry);
        assert_eq!(symbols.len(), 1);
    }
}
