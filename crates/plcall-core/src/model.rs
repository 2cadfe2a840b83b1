//! Subprogram signatures: functions, arguments and their flavors.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::plan::BlobFormat;
use crate::types::Scalar;
use crate::utils::{claim, to_snake_case};

/// Field holding the return value in request and response trees.
pub const RETURN_FIELD: &str = "ret";

/// Parameter mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn is_input(self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    pub fn is_output(self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            "IN/OUT" | "IN OUT" | "INOUT" => Ok(Self::InOut),
            other => Err(format!("unknown argument direction: {other:?}")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::InOut => "IN/OUT",
        })
    }
}

/// Structural class of an argument, derived from the raw catalog type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    Simple,
    Record,
    Table,
}

impl Flavor {
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type.trim().to_ascii_uppercase().as_str() {
            "PL/SQL RECORD" => Self::Record,
            "TABLE" | "PL/SQL TABLE" | "REF CURSOR" | "VARRAY" => Self::Table,
            _ => Self::Simple,
        }
    }
}

/// Shape of an argument. Records and tables nest arbitrarily.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgType {
    Simple(Scalar),
    Record {
        type_name: Option<String>,
        fields: Vec<Argument>,
    },
    Table {
        type_name: Option<String>,
        /// Anonymous element argument; `None` until the catalog supplied one.
        elem: Option<Box<Argument>>,
        /// Nested table or varray: grows with `EXTEND` instead of by index.
        nested: bool,
        cursor: bool,
    },
}

impl ArgType {
    pub fn flavor(&self) -> Flavor {
        match self {
            Self::Simple(_) => Flavor::Simple,
            Self::Record { .. } => Flavor::Record,
            Self::Table { .. } => Flavor::Table,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Simple(s) => s.type_name.as_deref(),
            Self::Record { type_name, .. } | Self::Table { type_name, .. } => type_name.as_deref(),
        }
    }
}

/// A named, directed argument. Empty names mark return values and
/// collection elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub position: u32,
    pub direction: Direction,
    pub ty: ArgType,
}

impl Argument {
    pub fn new(name: impl Into<String>, direction: Direction, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            position: 0,
            direction,
            ty,
        }
    }

    pub fn at(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    pub fn flavor(&self) -> Flavor {
        self.ty.flavor()
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self.ty, ArgType::Table { cursor: true, .. })
    }
}

/// Redirect of a function's whole argument set through a single blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub function: Box<Function>,
    pub format: BlobFormat,
}

/// One callable subprogram.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub package: String,
    pub name: String,
    pub overload: Option<u32>,
    pub alias: Option<String>,
    pub args: Vec<Argument>,
    pub returns: Option<Argument>,
    pub replacement: Option<Replacement>,
    /// Exception names whose handler is a no-op around the call.
    pub handles: Vec<String>,
    pub tags: Vec<String>,
    pub max_table_size: Option<usize>,
}

impl Function {
    /// `PACKAGE.NAME` as called from PL/SQL.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Generated-code identifier: the alias if set, else the name, with the
    /// overload number appended for overloaded subprograms.
    pub fn ident(&self) -> String {
        if let Some(alias) = &self.alias {
            return to_snake_case(alias);
        }
        match self.overload {
            Some(n) => format!("{}_{n}", to_snake_case(&self.name)),
            None => to_snake_case(&self.name),
        }
    }

    /// Whether any output (argument or return) is a REF CURSOR.
    pub fn streams(&self) -> bool {
        self.args
            .iter()
            .chain(self.returns.iter())
            .any(|a| a.direction.is_output() && a.is_cursor())
    }

    /// Request/response field names of the arguments, in order, and of the
    /// return value. Unique within the function: arguments keep their
    /// snake_case names first, and the return value moves off `ret` when an
    /// argument already holds it.
    pub fn field_names(&self) -> (Vec<String>, Option<String>) {
        let mut used = HashSet::new();
        let args = self
            .args
            .iter()
            .map(|arg| claim(&mut used, to_snake_case(&arg.name)))
            .collect();
        let ret = self
            .returns
            .as_ref()
            .map(|_| claim(&mut used, RETURN_FIELD.to_string()));
        (args, ret)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())?;
        if let Some(n) = self.overload {
            write!(f, "#{n}")?;
        }
        Ok(())
    }
}
