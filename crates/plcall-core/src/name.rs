//! Type references as they appear in the catalog, and their canonical keys.
//!
//! A reference can be partial: `NAME`, `PREFIX.NAME` (owner or package),
//! `OWNER.PACKAGE.NAME`, or `[OWNER.]TABLE%ROWTYPE`. Resolution tries every
//! shape the reference admits, in a fixed order, via [`TypeName::candidates`].

use std::fmt;

use serde::{Deserialize, Serialize};

const ROWTYPE_SUFFIX: &str = "%ROWTYPE";

/// Fully qualified, upper-cased type key: `OWNER.PACKAGE.NAME`, `OWNER.NAME`
/// or `OWNER.TABLE%ROWTYPE`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalName(String);

impl CanonicalName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_rowtype(&self) -> bool {
        self.0.ends_with(ROWTYPE_SUFFIX)
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error for type references that fit none of the supported shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameError(pub String);

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed type reference: {:?}", self.0)
    }
}

impl std::error::Error for NameError {}

/// A parsed, possibly partial, type reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeName {
    Bare { name: String },
    /// `A.B`: either `OWNER.NAME` or `PACKAGE.NAME` in the default owner.
    Qualified { prefix: String, name: String },
    Full { owner: String, package: String, name: String },
    RowType { owner: Option<String>, table: String },
}

/// One concrete (owner, package, name) triple to look up in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub owner: String,
    pub package: Option<String>,
    pub name: String,
    pub rowtype: bool,
}

impl QualifiedName {
    pub fn new(owner: &str, package: Option<&str>, name: &str) -> Self {
        Self {
            owner: normalize(owner),
            package: package.filter(|p| !p.is_empty()).map(normalize),
            name: normalize(name),
            rowtype: false,
        }
    }

    pub fn rowtype(owner: &str, table: &str) -> Self {
        Self {
            owner: normalize(owner),
            package: None,
            name: normalize(table),
            rowtype: true,
        }
    }

    pub fn canonical(&self) -> CanonicalName {
        let mut s = self.owner.clone();
        if let Some(package) = &self.package {
            s.push('.');
            s.push_str(package);
        }
        s.push('.');
        s.push_str(&self.name);
        if self.rowtype {
            s.push_str(ROWTYPE_SUFFIX);
        }
        CanonicalName(s)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical().as_str())
    }
}

impl TypeName {
    /// Split a reference on dots, honoring a trailing `%ROWTYPE`.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let upper = normalize(s);
        if upper.is_empty() {
            return Err(NameError(s.to_string()));
        }

        if let Some(base) = upper.strip_suffix(ROWTYPE_SUFFIX) {
            let parts: Vec<&str> = base.split('.').collect();
            return match parts.as_slice() {
                [table] if !table.is_empty() => Ok(Self::RowType {
                    owner: None,
                    table: table.to_string(),
                }),
                [owner, table] if !owner.is_empty() && !table.is_empty() => Ok(Self::RowType {
                    owner: Some(owner.to_string()),
                    table: table.to_string(),
                }),
                _ => Err(NameError(s.to_string())),
            };
        }

        let parts: Vec<&str> = upper.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(NameError(s.to_string()));
        }
        match parts.as_slice() {
            [name] => Ok(Self::Bare {
                name: name.to_string(),
            }),
            [prefix, name] => Ok(Self::Qualified {
                prefix: prefix.to_string(),
                name: name.to_string(),
            }),
            [owner, package, name] => Ok(Self::Full {
                owner: owner.to_string(),
                package: package.to_string(),
                name: name.to_string(),
            }),
            _ => Err(NameError(s.to_string())),
        }
    }

    /// Concrete lookups to try, most specific first.
    pub fn candidates(&self, default_owner: &str) -> Vec<QualifiedName> {
        match self {
            Self::Bare { name } => vec![QualifiedName::new(default_owner, None, name)],
            Self::Qualified { prefix, name } => vec![
                QualifiedName::new(prefix, None, name),
                QualifiedName::new(default_owner, Some(prefix), name),
            ],
            Self::Full {
                owner,
                package,
                name,
            } => vec![QualifiedName::new(owner, Some(package), name)],
            Self::RowType { owner, table } => vec![QualifiedName::rowtype(
                owner.as_deref().unwrap_or(default_owner),
                table,
            )],
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare { name } => f.write_str(name),
            Self::Qualified { prefix, name } => write!(f, "{prefix}.{name}"),
            Self::Full {
                owner,
                package,
                name,
            } => write!(f, "{owner}.{package}.{name}"),
            Self::RowType {
                owner: Some(owner),
                table,
            } => write!(f, "{owner}.{table}{ROWTYPE_SUFFIX}"),
            Self::RowType { owner: None, table } => write!(f, "{table}{ROWTYPE_SUFFIX}"),
        }
    }
}

/// Catalog identifiers are case-insensitive unless quoted; quotes are dropped.
fn normalize(s: &str) -> String {
    s.trim().replace('"', "").to_ascii_uppercase()
}
