use std::fmt;
use std::io::Read;

use crate::cursor::RowCursor;
use crate::value::Value;

/// One positional bind handed to the driver.
///
/// `In` values are read by the driver. `Out` boxes are written back; an
/// `IN OUT` parameter is an `Out` box that already holds its input.
#[derive(Debug)]
pub enum Bind {
    In(Value),
    Out(OutBox),
}

/// Output side of a bind.
#[derive(Debug, Default)]
pub struct OutBox {
    pub value: Value,
    /// Maximum element count for array binds.
    pub capacity: Option<usize>,
    /// Set by drivers that hand back cursors or LOB locators instead of
    /// plain values.
    pub stream: Option<Stream>,
}

/// Lazily read output.
pub enum Stream {
    Cursor(Box<dyn RowCursor>),
    Lob(Box<dyn Read + Send>),
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cursor(_) => f.write_str("Stream::Cursor(..)"),
            Self::Lob(_) => f.write_str("Stream::Lob(..)"),
        }
    }
}

impl OutBox {
    pub fn new(value: Value, capacity: Option<usize>) -> Self {
        Self {
            value,
            capacity,
            stream: None,
        }
    }
}

impl Bind {
    pub fn value(&self) -> &Value {
        match self {
            Self::In(value) => value,
            Self::Out(out) => &out.value,
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Self::Out(_))
    }

    pub fn out_mut(&mut self) -> Option<&mut OutBox> {
        match self {
            Self::In(_) => None,
            Self::Out(out) => Some(out),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::In(_) => None,
            Self::Out(out) => out.capacity,
        }
    }
}
