//! String interner implementation backed by `FxHashMap`.
//!
//! The compiler pipeline runs single-threaded and synchronous (§5), so the
//! interner favors a simple `RwLock<FxHashMap<...>>` over a lock-free
//! concurrent map: contention never arises in practice, and `FxHasher` is
//! faster than a cryptographic hash for the short identifier strings a
//! source file actually contains.
//!
//! # Performance Characteristics
//!
//! - **Interning (hit)**: O(1) - hash lookup only.
//! - **Interning (miss)**: O(1) amortized - hash insert + allocation.
//! - **Symbol comparison**: O(1) - index comparison.
//! - **String retrieval**: O(1) - direct vector index.

use rustc_hash::FxHashMap;
use std::sync::{LazyLock, RwLock};

use super::{InternerStats, Symbol};

/// Global string table instance, initialized on first use.
///
/// All known keywords and runtime-library names are pre-interned during
/// initialization so they have stable, predictable indices.
pub static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable::new();
    table.initialize_known_symbols();
    table
});

const RESERVED_SYMBOLS_END: u32 = 48;

struct Tables {
    /// Maps an interned string to its symbol index.
    index: FxHashMap<&'static str, u32>,
    /// Maps a symbol index back to its string, for `as_str`/`get`.
    strings: Vec<&'static str>,
    hits: usize,
    misses: usize,
}

/// Thread-safe string table guarded by a single `RwLock`.
pub struct StringTable {
    tables: RwLock<Tables>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                index: FxHashMap::default(),
                strings: Vec::with_capacity(RESERVED_SYMBOLS_END as usize),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Pre-intern every keyword and runtime-library name so they land at
    /// the fixed indices declared as constants in `symbol::mod`.
    ///
    /// Must be called exactly once, before any other symbol is interned.
    fn initialize_known_symbols(&self) {
        let known_symbols = [
            "program",
            "function",
            "procedure",
            "var",
            "begin",
            "end",
            "if",
            "then",
            "else",
            "while",
            "do",
            "not",
            "and",
            "or",
            "div",
            "mod",
            "ref",
            "true",
            "false",
            "return",
            "int",
            "char",
        ];

        let mut tables = self.tables.write().expect("string table lock poisoned");
        for symbol in known_symbols {
            let interned: &'static str = Box::leak(symbol.to_string().into_boxed_str());
            let idx = tables.strings.len() as u32;
            tables.strings.push(interned);
            tables.index.insert(interned, idx);
        }

        // Reserve the gaps between keyword/runtime blocks (§3 known-symbol
        // layout) so later `Symbol::intern_known` constants stay aligned.
        while tables.strings.len() < RESERVED_SYMBOLS_END as usize {
            let idx = tables.strings.len() as u32;
            let placeholder: &'static str = Box::leak(format!("<reserved{idx}>").into_boxed_str());
            tables.strings.push(placeholder);
        }

        let runtime_symbols: [(&str, u32); 12] = [
            ("writeInteger", 30),
            ("writeChar", 31),
            ("writeString", 32),
            ("readInteger", 33),
            ("readChar", 34),
            ("readString", 35),
            ("ascii", 36),
            ("chr", 37),
            ("strlen", 38),
            ("strcmp", 39),
            ("strcpy", 40),
            ("strcat", 41),
        ];
        for (name, idx) in runtime_symbols {
            let interned: &'static str = Box::leak(name.to_string().into_boxed_str());
            tables.strings[idx as usize] = interned;
            tables.index.insert(interned, idx);
        }
    }

    /// Intern a string, returning its symbol.
    pub fn intern(&self, string: &str) -> Symbol {
        {
            let tables = self.tables.read().expect("string table lock poisoned");
            if let Some(&idx) = tables.index.get(string) {
                return Symbol { index: idx };
            }
        }

        let mut tables = self.tables.write().expect("string table lock poisoned");
        // Re-check: another writer may have interned this string while we
        // waited for the write lock.
        if let Some(&idx) = tables.index.get(string) {
            tables.hits += 1;
            return Symbol { index: idx };
        }

        tables.misses += 1;
        let interned: &'static str = Box::leak(string.to_string().into_boxed_str());
        let idx = tables.strings.len() as u32;
        tables.strings.push(interned);
        tables.index.insert(interned, idx);
        Symbol { index: idx }
    }

    /// Get string by symbol.
    pub fn get(&self, symbol: Symbol) -> Option<&'static str> {
        let tables = self.tables.read().expect("string table lock poisoned");
        tables.strings.get(symbol.index as usize).copied()
    }

    /// Get statistics about the string table for profiling.
    pub fn stats(&self) -> InternerStats {
        let tables = self.tables.read().expect("string table lock poisoned");
        InternerStats {
            count: tables.strings.len(),
            capacity: tables.index.capacity(),
            collisions: 0,
            hits: tables.hits,
            misses: tables.misses,
        }
    }

    #[cfg(test)]
    pub(crate) fn reset_stats(&self) {
        let mut tables = self.tables.write().expect("string table lock poisoned");
        tables.hits = 0;
        tables.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_same_string() {
        let s1 = STRING_TABLE.intern("hello");
        let s2 = STRING_TABLE.intern("hello");
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_intern_different_strings() {
        let s1 = STRING_TABLE.intern("hello");
        let s2 = STRING_TABLE.intern("world");
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_get_string() {
        let symbol = STRING_TABLE.intern("test_string");
        assert_eq!(STRING_TABLE.get(symbol), Some("test_string"));
    }

    #[test]
    fn test_known_symbols_preinterned() {
        let program = STRING_TABLE.intern("program");
        assert_eq!(program.as_u32(), 0);
        let strcat = STRING_TABLE.intern("strcat");
        assert_eq!(strcat.as_u32(), 41);
    }

    #[test]
    fn test_stats_tracking() {
        STRING_TABLE.reset_stats();

        let _ = STRING_TABLE.intern("new_unique_string_12345");
        let stats = STRING_TABLE.stats();
        assert!(stats.misses >= 1);

        let _ = STRING_TABLE.intern("new_unique_string_12345");
        let stats = STRING_TABLE.stats();
        assert!(stats.hits >= 1);
    }

    #[test]
    fn test_empty_string() {
        let s = STRING_TABLE.intern("");
        assert_eq!(STRING_TABLE.get(s), Some(""));
    }

    #[test]
    fn test_unicode_strings() {
        let test_cases = ["变量", "caractère", "🦀"];
        for test in test_cases {
            let sym = STRING_TABLE.intern(test);
            assert_eq!(STRING_TABLE.get(sym), Some(test));
        }
    }

    #[test]
    fn test_many_distinct_identifiers() {
        let mut symbols = Vec::new();
        for i in 0..500 {
            symbols.push(STRING_TABLE.intern(&format!("ident_{i}")));
        }
        for i in 0..symbols.len() {
            for j in (i + 1)..symbols.len() {
                assert_ne!(symbols[i], symbols[j]);
            }
        }
    }
}
