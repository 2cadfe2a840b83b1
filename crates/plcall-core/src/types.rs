//! Structural type definitions shared by the type graph and argument trees.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name::CanonicalName;

/// A primitive catalog type with its size attributes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scalar {
    /// Catalog data type (`VARCHAR2`, `NUMBER`, `DATE`, ...).
    pub name: String,
    pub length: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<i8>,
    /// Named type behind an opaque or not-yet-expanded scalar (`SYS.XMLTYPE`).
    pub type_name: Option<String>,
}

/// Host-side representation chosen for a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Int,
    /// Arbitrary precision number carried as a decimal string.
    Decimal,
    Float,
    Bool,
    Text,
    Bytes,
    Timestamp,
    Clob,
    Blob,
}

impl ScalarKind {
    pub fn is_lob(self) -> bool {
        matches!(self, Self::Clob | Self::Blob)
    }
}

impl Scalar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            length: None,
            precision: None,
            scale: None,
            type_name: None,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u8, scale: i8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Pick the host representation; integer vs decimal follows precision.
    pub fn kind(&self) -> ScalarKind {
        match self.name.as_str() {
            "PLS_INTEGER" | "BINARY_INTEGER" | "SIMPLE_INTEGER" | "INTEGER" | "NATURAL"
            | "NATURALN" | "POSITIVE" | "POSITIVEN" | "SIGNTYPE" => ScalarKind::Int,
            "NUMBER" => match (self.precision, self.scale) {
                (Some(p), Some(0) | None) if (1..=18).contains(&p) => ScalarKind::Int,
                _ => ScalarKind::Decimal,
            },
            "BINARY_FLOAT" | "BINARY_DOUBLE" | "FLOAT" => ScalarKind::Float,
            "BOOLEAN" | "PL/SQL BOOLEAN" => ScalarKind::Bool,
            "DATE" => ScalarKind::Timestamp,
            "CLOB" | "NCLOB" => ScalarKind::Clob,
            "BLOB" | "BFILE" => ScalarKind::Blob,
            "RAW" | "LONG RAW" => ScalarKind::Bytes,
            name if name.starts_with("TIMESTAMP") => ScalarKind::Timestamp,
            _ => ScalarKind::Text,
        }
    }

    /// Whether this scalar still names a composite type nobody expanded.
    pub fn is_unexpanded_object(&self) -> bool {
        self.name == "OBJECT"
    }

    /// Element declaration for a PL/SQL index-by table of this scalar.
    pub fn plsql_elem_decl(&self) -> String {
        match self.kind() {
            ScalarKind::Int | ScalarKind::Decimal => "NUMBER".to_string(),
            ScalarKind::Float => self.name.clone(),
            ScalarKind::Bool => "BOOLEAN".to_string(),
            ScalarKind::Timestamp if self.name == "DATE" => "DATE".to_string(),
            ScalarKind::Timestamp => "TIMESTAMP".to_string(),
            ScalarKind::Clob => "CLOB".to_string(),
            ScalarKind::Blob => "BLOB".to_string(),
            ScalarKind::Bytes => format!("RAW({})", self.length.unwrap_or(2000)),
            ScalarKind::Text => {
                let base = match self.name.as_str() {
                    "NVARCHAR2" | "NCHAR" => "NVARCHAR2",
                    _ => "VARCHAR2",
                };
                format!("{base}({})", self.length.filter(|l| *l > 0).unwrap_or(32767))
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(type_name) = &self.type_name {
            return f.write_str(type_name);
        }
        f.write_str(&self.name)?;
        match (self.length, self.precision, self.scale) {
            (_, Some(p), Some(s)) if s != 0 => write!(f, "({p},{s})"),
            (_, Some(p), _) => write!(f, "({p})"),
            (Some(l), _, _) if l > 0 => write!(f, "({l})"),
            _ => Ok(()),
        }
    }
}

/// Key kind of an associative collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexBy {
    /// `INDEX BY PLS_INTEGER` / `BINARY_INTEGER`.
    Integer,
}

/// Reference from a field or element to its type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Scalar(Scalar),
    Named(CanonicalName),
}

/// One record field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
}

/// Structural definition of a resolved named type.
///
/// Exactly one shape is populated; records are never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDef {
    Scalar(Scalar),
    Record(Vec<Field>),
    Collection {
        elem: TypeRef,
        index_by: Option<IndexBy>,
    },
}

impl TypeDef {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Record(_) => "record",
            Self::Collection { .. } => "collection",
        }
    }
}
