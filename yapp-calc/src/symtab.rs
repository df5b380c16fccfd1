//! # symtab
//!
//! A flat variable table built on [`indexmap::IndexMap`].
//!
//! Variables are kept in order of first assignment, so listing the table
//! shows bindings in the order the program created them.
//!
//! ## Example
//! ```rust
//! # use yapp_calc::SymTab;
//! let mut st = SymTab::new();
//! assert!(st.lookup("x").is_err());
//! let i = st.assign("x", 42);
//! assert_eq!(i, 0);
//! assert_eq!(st.lookup("x").unwrap(), 42);
//! assert_eq!(st.assign("x", 7), i); // same slot, new value
//! assert_eq!(st.lookup("x").unwrap(), 7);
//! ```

use indexmap::{IndexMap, map::Entry};
use smartstring::alias::String;
use thiserror::Error;

/// Errors that can occur when operating on a [`SymTab`].
#[derive(Debug, Error)]
pub enum SymTabError {
    /// A variable was read before any assignment.
    #[error("undefined variable {name}")]
    Undefined {
        /// The variable that was requested.
        name: String,
    },
}

/// Maps variable names to integer values.
#[derive(Debug, Default)]
pub struct SymTab {
    tab: IndexMap<String, i64>,
}

impl SymTab {
    /// Creates a new, empty symbol table.
    pub fn new() -> Self {
        Self {
            tab: IndexMap::new(),
        }
    }

    /// Returns the number of variables bound so far.
    pub fn len(&self) -> usize {
        self.tab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tab.is_empty()
    }

    /// Binds `name` to `value` and returns the variable's index.
    ///
    /// Re-assigning keeps the original index.
    pub fn assign(&mut self, name: impl AsRef<str>, value: i64) -> usize {
        match self.tab.entry(String::from(name.as_ref())) {
            Entry::Occupied(mut o) => {
                o.insert(value);
                o.index()
            }
            Entry::Vacant(v) => {
                let o = v.insert_entry(value);
                o.index()
            }
        }
    }

    /// Returns the value bound to `name`.
    pub fn lookup(&self, name: &str) -> Result<i64, SymTabError> {
        self.tab
            .get(name)
            .copied()
            .ok_or_else(|| SymTabError::Undefined { name: name.into() })
    }

    /// Bindings in order of first assignment.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.tab.iter().map(|(name, value)| (name.as_str(), *value))
    }
}
