//! Request and response value trees.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDateTime;
use plcall_core::{PathSeg, ValuePath};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tempfile::TempPath;

/// Text form of timestamps in requests, responses and blobs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A LOB too large to keep in memory, parked in a temp file.
///
/// The file is removed when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct SpilledLob {
    pub(crate) path: Arc<TempPath>,
    pub(crate) len: u64,
}

impl SpilledLob {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn open(&self) -> std::io::Result<File> {
        File::open(self.path())
    }
}

impl PartialEq for SpilledLob {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path() && self.len == other.len
    }
}

/// Self-contained request or response value.
///
/// `Object` uses `Vec<(String, Value)>` to keep field order.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact number, kept as its decimal text.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Spilled(SpilledLob),
    Object(Vec<(String, Value)>),
    List(Vec<Value>),
}

impl Value {
    pub fn object() -> Self {
        Self::Object(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::Spilled(_) => "spilled lob",
            Self::Object(_) => "object",
            Self::List(_) => "list",
        }
    }

    /// Field of an object.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Self::Object(fields) => fields.iter().find(|(k, _)| k == field).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: &str, value: Value) -> Self {
        self.set(&ValuePath::root().field(field), value);
        self
    }

    /// Value at a path of field steps. Paths through lists yield `None`.
    pub fn lookup(&self, path: &ValuePath) -> Option<&Value> {
        let mut current = self;
        for seg in path.segments() {
            current = match seg {
                PathSeg::Field(name) => current.get(name)?,
                PathSeg::Each => return None,
            };
        }
        Some(current)
    }

    /// Values at `list[*].inner`, one per list element. A missing or null
    /// list is empty; `None` means something other than a list is there.
    pub fn column(&self, path: &ValuePath) -> Option<Vec<&Value>> {
        let (list, inner) = path.split_each()?;
        match self.lookup(&list) {
            None | Some(Value::Null) => Some(Vec::new()),
            Some(Value::List(items)) => Some(
                items
                    .iter()
                    .map(|item| item.lookup(&inner).unwrap_or(&Value::Null))
                    .collect(),
            ),
            Some(_) => None,
        }
    }

    /// Store `value` at `path`, creating objects along the way.
    pub fn set(&mut self, path: &ValuePath, value: Value) {
        *self.entry(path.segments()) = value;
    }

    /// Store one value per list element at `list[*].inner`, growing the list
    /// as needed.
    pub fn set_column(&mut self, path: &ValuePath, values: Vec<Value>) {
        let Some((list, inner)) = path.split_each() else {
            self.set(path, Value::List(values));
            return;
        };
        let target = self.entry(list.segments());
        if !matches!(target, Value::List(_)) {
            *target = Value::List(Vec::new());
        }
        let Value::List(items) = target else {
            unreachable!()
        };
        if items.len() < values.len() {
            items.resize(values.len(), Value::Null);
        }
        for (item, value) in items.iter_mut().zip(values) {
            item.set(&inner, value);
        }
    }

    fn entry(&mut self, path: &[PathSeg]) -> &mut Value {
        let Some((PathSeg::Field(name), rest)) = path.split_first() else {
            return self;
        };
        if !matches!(self, Value::Object(_)) {
            *self = Value::object();
        }
        let Value::Object(fields) = self else {
            unreachable!()
        };
        let index = match fields.iter().position(|(k, _)| k == name) {
            Some(index) => index,
            None => {
                fields.push((name.clone(), Value::Null));
                fields.len() - 1
            }
        };
        fields[index].1.entry(rest)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Decimal(s) | Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&BASE64.encode(b)),
            Value::Timestamp(t) => {
                serializer.serialize_str(&t.format(TIMESTAMP_FORMAT).to_string())
            }
            Value::Spilled(lob) => Err(S::Error::custom(format!(
                "spilled LOB of {} bytes cannot be serialized inline",
                lob.len
            ))),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None if n.is_u64() => Value::Decimal(n.to_string()),
                None => n
                    .as_f64()
                    .map_or_else(|| Value::Decimal(n.to_string()), Value::Float),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
