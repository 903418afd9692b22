// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thread-safe string interning for type names and enumeration tokens
//!
//! IFC files repeat a small vocabulary of keywords (`IFCCARTESIANPOINT`,
//! `.ELEMENT.`, ...) hundreds of thousands of times. The interner keeps one
//! shared allocation per distinct string. A process-wide instance is
//! available through [`Interner::global`]; parsers may also carry a scoped
//! instance so that tests and sessions stay isolated.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL: Lazy<Arc<Interner>> = Lazy::new(|| Arc::new(Interner::new()));

/// Concurrent string interner
#[derive(Debug, Default)]
pub struct Interner {
    strings: RwLock<FxHashSet<Arc<str>>>,
}

impl Interner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide interner
    pub fn global() -> Arc<Interner> {
        Arc::clone(&GLOBAL)
    }

    /// Return the shared instance for `value`, inserting it if needed
    pub fn intern(&self, value: &str) -> Arc<str> {
        {
            let strings = self.strings.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = strings.get(value) {
                return Arc::clone(existing);
            }
        }

        let mut strings = self.strings.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have inserted between the two locks
        if let Some(existing) = strings.get(value) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(value);
        strings.insert(Arc::clone(&interned));
        interned
    }

    /// Number of distinct strings held
    pub fn len(&self) -> usize {
        self.strings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if nothing has been interned yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_same_string_shares_allocation() {
        let interner = Interner::new();
        let a = interner.intern("IFCWALL");
        let b = interner.intern(&String::from("IFCWALL"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_distinct_strings() {
        let interner = Interner::new();
        interner.intern("HEADER");
        interner.intern("DATA");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_concurrent_population() {
        let interner = Arc::new(Interner::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = Arc::clone(&interner);
                thread::spawn(move || {
                    (0..50)
                        .map(|i| interner.intern(&format!("NAME_{}", i % 10)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(interner.len(), 10);
        for (a, b) in results[0].iter().zip(&results[1]) {
            assert!(Arc::ptr_eq(a, b));
        }
    }
}
