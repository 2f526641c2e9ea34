//! Macro table populated by `define` directives.

use std::collections::{BTreeMap, btree_map::Iter};

use serde::Serialize;
use tracing::debug;

/// Identifier to replacement-text mapping.
///
/// Entries are only ever added (by `define`) and are never removed; defining an
/// identifier again replaces the earlier text. Lookups are exact and
/// case-sensitive. The table is filled while a configuration loads and is only
/// read afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MacroTable {
    /// Defined macros, ordered for stable dumps.
    entries: BTreeMap<String, String>,
}

impl MacroTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `ident` → `value`, returning the text it replaced, if any.
    pub fn define(&mut self, ident: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let ident = ident.into();
        let value = value.into();
        debug!(macro_name = %ident, value = %value, "define");
        self.entries.insert(ident, value)
    }

    /// Replacement text for `ident`.
    pub fn get(&self, ident: &str) -> Option<&str> {
        self.entries.get(ident).map(String::as_str)
    }

    /// Whether `ident` has been defined.
    pub fn contains(&self, ident: &str) -> bool {
        self.entries.contains_key(ident)
    }

    /// `ident` replaced by its definition, or `ident` itself when undefined.
    pub fn substitute<'a>(&'a self, ident: &'a str) -> &'a str {
        self.get(ident).unwrap_or(ident)
    }

    /// Number of defined macros.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(ident, value)` pairs in identifier order.
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_define_wins() {
        let mut m = MacroTable::new();
        assert_eq!(m.define("Clock", "1"), None);
        assert_eq!(m.define("Clock", "2"), Some("1".to_string()));
        assert_eq!(m.get("Clock"), Some("2"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn lookup_is_exact() {
        let mut m = MacroTable::new();
        m.define("Clock", "x");
        assert!(m.contains("Clock"));
        assert!(!m.contains("clock"));
        assert_eq!(m.substitute("clock"), "clock");
        assert_eq!(m.substitute("Clock"), "x");
    }
}
