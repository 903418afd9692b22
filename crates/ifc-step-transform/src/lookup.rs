// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named external code resolvers
//!
//! Domain specific transforms (for example turning a coded material
//! reference into a readable name) are supplied by the host application.
//! Templates refer to them by name; the registry only holds the indirection.

use crate::error::{Result, TransformError};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Resolve a code to its JSON value
pub trait CodeLookup: Send + Sync {
    fn resolve(&self, code: &str) -> Result<Value>;
}

impl<F> CodeLookup for F
where
    F: Fn(&str) -> Result<Value> + Send + Sync,
{
    fn resolve(&self, code: &str) -> Result<Value> {
        self(code)
    }
}

/// Registry of code lookups by transform name
#[derive(Clone, Default)]
pub struct Lookups {
    lookups: FxHashMap<String, Arc<dyn CodeLookup>>,
}

impl Lookups {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lookup, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, lookup: impl CodeLookup + 'static) {
        self.lookups.insert(name.into(), Arc::new(lookup));
    }

    /// Builder form of [`Lookups::register`]
    pub fn with(mut self, name: impl Into<String>, lookup: impl CodeLookup + 'static) -> Self {
        self.register(name, lookup);
        self
    }

    /// Lookup registered under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CodeLookup>> {
        self.lookups.get(name)
    }

    /// Check if a lookup is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.lookups.contains_key(name)
    }

    /// Number of registered lookups
    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl fmt::Debug for Lookups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.lookups.keys().collect();
        names.sort();
        f.debug_struct("Lookups").field("names", &names).finish()
    }
}

/// Lookup backed by a fixed code table
#[derive(Clone, Debug, Default)]
pub struct TableLookup {
    name: String,
    entries: FxHashMap<String, Value>,
}

impl TableLookup {
    /// Create an empty table; `name` is reported in lookup errors
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: FxHashMap::default(),
        }
    }

    /// Add the value for a code
    pub fn with_entry(mut self, code: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(code.into(), value.into());
        self
    }
}

impl CodeLookup for TableLookup {
    fn resolve(&self, code: &str) -> Result<Value> {
        self.entries
            .get(code)
            .cloned()
            .ok_or_else(|| TransformError::Lookup {
                lookup: self.name.clone(),
                code: code.to_string(),
                reason: "unknown code".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_closure() {
        let lookups = Lookups::new().with("UPPER", |code: &str| -> Result<Value> {
            Ok(Value::String(code.to_uppercase()))
        });
        assert!(lookups.contains("UPPER"));
        assert_eq!(lookups.len(), 1);
        let value = lookups.get("UPPER").unwrap().resolve("abc").unwrap();
        assert_eq!(value, json!("ABC"));
    }

    #[test]
    fn test_table_lookup() {
        let table = TableLookup::new("MATERIAL")
            .with_entry("M1", "Concrete")
            .with_entry("M2", json!({"name": "Steel"}));
        assert_eq!(table.resolve("M1").unwrap(), json!("Concrete"));
        assert_eq!(table.resolve("M2").unwrap()["name"], json!("Steel"));
        assert!(matches!(
            table.resolve("M3"),
            Err(TransformError::Lookup { code, .. }) if code == "M3"
        ));
    }

    #[test]
    fn test_debug_lists_names() {
        let lookups = Lookups::new()
            .with("B", TableLookup::new("B"))
            .with("A", TableLookup::new("A"));
        assert_eq!(format!("{:?}", lookups), "Lookups { names: [\"A\", \"B\"] }");
    }
}
