//! Nested function signatures rebuilt from leveled argument rows.
//!
//! The catalog flattens each subprogram's argument tree depth-first, one row
//! per node, with a nesting level. Rebuilding keeps a stack of the
//! composites still open at each level: a row attaches to the composite open
//! one level above it, and a composite row opens its own level.

mod build;
mod flatten;


pub use build::build_functions;
pub use flatten::flatten;

use std::collections::BTreeSet;

use plcall_core::{ArgType, Direction};

use crate::Result;

/// Source of argument subtrees for named types the rows do not spell out.
pub trait TypeLookup {
    fn lookup(&self, reference: &str, direction: Direction) -> Result<ArgType>;
}

/// Which subprograms to build. Entries are `PACKAGE`, `NAME` or
/// `PACKAGE.NAME`, matched case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct FunctionFilter {
    only: BTreeSet<String>,
    skip: BTreeSet<String>,
}

impl FunctionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict building to matching subprograms.
    pub fn only(mut self, name: &str) -> Self {
        self.only.insert(name.trim().to_ascii_uppercase());
        self
    }

    pub fn skip(mut self, name: &str) -> Self {
        self.skip.insert(name.trim().to_ascii_uppercase());
        self
    }

    pub fn accepts(&self, package: &str, object: &str) -> bool {
        let package = package.to_ascii_uppercase();
        let object = object.to_ascii_uppercase();
        let qualified = format!("{package}.{object}");
        let hit = |set: &BTreeSet<String>| {
            set.contains(&qualified) || set.contains(&object) || set.contains(&package)
        };
        (self.only.is_empty() || hit(&self.only)) && !hit(&self.skip)
    }
}
