//! Delimited catalog rows.
//!
//! Argument rows carry one row per argument node, flattened depth-first.
//! Type rows carry one row per attribute, element or column of a named type.

use std::io::Read;

use plcall_core::{Direction, QualifiedName, Scalar};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AttrRow;
use crate::{Error, Result};

/// Marker suffix for subprograms that must not be exposed.
pub const HIDDEN_MARKER: char = '#';

/// One argument row as the catalog's argument view reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ArgRow {
    #[serde(default, alias = "PACKAGE")]
    pub package_name: String,
    #[serde(alias = "OBJECT")]
    pub object_name: String,
    #[serde(default)]
    pub overload: Option<u32>,
    /// Nesting depth; 0 for top-level arguments and the return value.
    #[serde(default, alias = "LEVEL")]
    pub data_level: u8,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub argument_name: String,
    #[serde(default)]
    pub in_out: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub data_precision: Option<u8>,
    #[serde(default)]
    pub data_scale: Option<i8>,
    #[serde(default, alias = "DATA_LENGTH")]
    pub char_length: Option<u32>,
    #[serde(default)]
    pub type_owner: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub type_subname: String,
    #[serde(default)]
    pub pls_type: String,
}

impl ArgRow {
    pub fn is_hidden(&self) -> bool {
        self.object_name.ends_with(HIDDEN_MARKER)
    }

    /// `(package, object, overload)`: rows sharing it describe one subprogram.
    pub fn subprogram_key(&self) -> (String, String, Option<u32>) {
        (
            self.package_name.to_ascii_uppercase(),
            self.object_name.to_ascii_uppercase(),
            self.overload,
        )
    }

    pub fn direction(&self) -> Result<Direction> {
        self.in_out.parse().map_err(|message: String| {
            Error::InternalConsistency(format!(
                "{}.{} argument {:?}: {message}",
                self.package_name, self.object_name, self.argument_name
            ))
        })
    }

    /// Dotted reference to the named type behind this row, if any.
    pub fn type_reference(&self) -> Option<String> {
        if self.type_name.is_empty() {
            return None;
        }
        let parts: Vec<&str> = [&self.type_owner, &self.type_name, &self.type_subname]
            .into_iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .collect();
        Some(parts.join("."))
    }

    /// Scalar description; the PL/SQL type wins over the SQL data type.
    pub fn scalar(&self) -> Scalar {
        let name = if self.pls_type.is_empty() {
            &self.data_type
        } else {
            &self.pls_type
        };
        let mut scalar = Scalar::new(name.as_str());
        if let Some(length) = self.char_length.filter(|l| *l > 0) {
            scalar = scalar.with_length(length);
        }
        if let Some(precision) = self.data_precision {
            scalar = scalar.with_precision(precision, self.data_scale.unwrap_or(0));
        }
        if let Some(reference) = self.type_reference() {
            scalar = scalar.with_type_name(reference);
        }
        scalar
    }
}

/// One row of a named type's definition.
///
/// Rows sharing owner, package and type name describe one type. `TYPECODE`
/// is `RECORD`, `OBJECT`, `COLLECTION`, `OPAQUE` or `TABLE` (a table or
/// view, read through `%ROWTYPE`). A collection has exactly one row, its
/// element, with an empty attribute name. An attribute without a type owner
/// or package is built in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TypeRow {
    #[serde(default)]
    pub owner: String,
    #[serde(default, alias = "PACKAGE")]
    pub package_name: String,
    #[serde(alias = "TABLE_NAME")]
    pub type_name: String,
    pub typecode: String,
    /// Key type of an associative collection.
    #[serde(default)]
    pub index_by: String,
    #[serde(default, alias = "ATTR_NO")]
    pub position: Option<u32>,
    #[serde(default, alias = "COLUMN_NAME")]
    pub attr_name: String,
    #[serde(default)]
    pub attr_type_owner: String,
    #[serde(default)]
    pub attr_type_package: String,
    #[serde(default, alias = "DATA_TYPE")]
    pub attr_type_name: String,
    #[serde(default, alias = "LENGTH")]
    pub char_length: Option<u32>,
    #[serde(default, alias = "PRECISION")]
    pub data_precision: Option<u8>,
    #[serde(default, alias = "SCALE")]
    pub data_scale: Option<i8>,
}

impl TypeRow {
    /// Name of the type this row belongs to.
    pub fn qualified_name(&self, default_owner: &str) -> QualifiedName {
        let owner = or_default(&self.owner, default_owner);
        if self.typecode.eq_ignore_ascii_case("TABLE") {
            return QualifiedName::rowtype(owner, &self.type_name);
        }
        let package = Some(self.package_name.as_str()).filter(|p| !p.is_empty());
        QualifiedName::new(owner, package, &self.type_name)
    }

    /// Whether the row carries an attribute rather than only the type header.
    pub fn has_attribute(&self) -> bool {
        !self.attr_type_name.is_empty()
    }

    pub fn attribute(&self, default_owner: &str) -> AttrRow {
        let name = self.attr_name.clone();
        if self.attr_type_owner.is_empty() && self.attr_type_package.is_empty() {
            let mut scalar = Scalar::new(self.attr_type_name.as_str());
            if let Some(length) = self.char_length.filter(|l| *l > 0) {
                scalar = scalar.with_length(length);
            }
            if let Some(precision) = self.data_precision {
                scalar = scalar.with_precision(precision, self.data_scale.unwrap_or(0));
            }
            return AttrRow::scalar(name, scalar);
        }

        let owner = or_default(&self.attr_type_owner, default_owner);
        let upper = self.attr_type_name.to_ascii_uppercase();
        if let Some(table) = upper.strip_suffix("%ROWTYPE") {
            return AttrRow::named(name, QualifiedName::rowtype(owner, table));
        }
        let package = Some(self.attr_type_package.as_str()).filter(|p| !p.is_empty());
        AttrRow::named(name, QualifiedName::new(owner, package, &self.attr_type_name))
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

/// Read argument rows from delimited text.
///
/// Columns are matched by header name, case-insensitively. The delimiter is
/// `;` when the header line has more semicolons than commas, else `,`.
pub fn read_arg_rows<R: Read>(reader: R) -> Result<Vec<ArgRow>> {
    read_rows(reader, "argument")
}

/// Read type definition rows, with the same header and delimiter rules as
/// [`read_arg_rows`].
pub fn read_type_rows<R: Read>(reader: R) -> Result<Vec<TypeRow>> {
    read_rows(reader, "type")
}

fn read_rows<T: DeserializeOwned, R: Read>(mut reader: R, kind: &str) -> Result<Vec<T>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.trim_start_matches('\u{feff}');

    let header = text.lines().next().unwrap_or_default();
    let delimiter = if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    };

    let mut csv = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers: csv::StringRecord = csv
        .headers()?
        .iter()
        .map(|h| h.to_ascii_uppercase())
        .collect();
    csv.set_headers(headers);

    let rows = csv
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()?;
    debug!(
        rows = rows.len(),
        kind,
        delimiter = %(delimiter as char),
        "read catalog rows"
    );
    Ok(rows)
}
