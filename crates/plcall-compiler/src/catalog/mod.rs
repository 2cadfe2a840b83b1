//! Metadata source interface.
//!
//! A [`Catalog`] answers two kinds of questions: the flat, leveled stream of
//! argument rows for a set of packages, and the structure of one named type.
//! Database-backed implementations live outside this crate; [`MemoryCatalog`]
//! serves tests and offline runs.

mod memory;
mod rows;

#[cfg(test)]
mod memory_tests;

pub use memory::MemoryCatalog;
pub use rows::{ArgRow, TypeRow, read_arg_rows, read_type_rows};

use plcall_core::{QualifiedName, Scalar};

use crate::Result;

/// What kind of object a qualified name denotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeClass {
    /// Schema-level or package record type.
    Record,
    /// Collection type; `index_by` is the key type of associative arrays.
    Collection { index_by: Option<String> },
    /// Table or view, referenced through `%ROWTYPE`.
    Table,
    /// Built-in opaque container (`SYS.XMLTYPE`, `SYS.ANYDATA`).
    Opaque,
    /// Schema-level type whose shape the catalog did not state.
    Object,
}

/// Type of one record attribute or collection element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrType {
    Scalar(Scalar),
    Named(QualifiedName),
}

/// One attribute, element or column row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrRow {
    pub name: String,
    pub ty: AttrType,
}

impl AttrRow {
    pub fn scalar(name: impl Into<String>, scalar: Scalar) -> Self {
        Self {
            name: name.into(),
            ty: AttrType::Scalar(scalar),
        }
    }

    pub fn named(name: impl Into<String>, type_name: QualifiedName) -> Self {
        Self {
            name: name.into(),
            ty: AttrType::Named(type_name),
        }
    }
}

/// Read access to the database's introspection catalog.
///
/// Every method is one logical query. Implementations report failures as
/// [`crate::Error::Catalog`].
pub trait Catalog: Send + Sync {
    /// Owner assumed for unqualified references.
    fn default_owner(&self) -> &str;

    /// Argument rows of the given packages (all packages when empty), in
    /// catalog order.
    fn arguments(&self, packages: &[String]) -> Result<Vec<ArgRow>>;

    /// Every named type the catalog exposes.
    fn type_names(&self) -> Result<Vec<QualifiedName>>;

    /// `None` when no object has this name.
    fn classify(&self, name: &QualifiedName) -> Result<Option<TypeClass>>;

    fn record_attributes(&self, name: &QualifiedName) -> Result<Vec<AttrRow>>;

    fn collection_element(&self, name: &QualifiedName) -> Result<Option<AttrRow>>;

    fn rowtype_columns(&self, name: &QualifiedName) -> Result<Vec<AttrRow>>;
}
