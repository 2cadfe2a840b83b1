//! Compiled call plans.
//!
//! A [`CallPlan`] is what the stub generator produces for one function and
//! what the runtime executes: the PL/SQL block text plus the ordered list of
//! positional bind slots the block refers to (`:1`, `:2`, ...). Each slot
//! says where its value lives in the request/response tree, which way it
//! flows, and how to convert it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Direction;
use crate::types::ScalarKind;

/// One step in a [`ValuePath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSeg {
    Field(String),
    /// Every element of a list.
    Each,
}

/// Location of a value inside a request or response tree, e.g. `items[*].qty`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePath(pub Vec<PathSeg>);

impl ValuePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Self {
        let mut segs = self.0.clone();
        segs.push(PathSeg::Field(name.to_string()));
        Self(segs)
    }

    pub fn each(&self) -> Self {
        let mut segs = self.0.clone();
        segs.push(PathSeg::Each);
        Self(segs)
    }

    /// Split at the first `[*]`: the list location and the path inside each
    /// element. `None` when the path has no list step.
    pub fn split_each(&self) -> Option<(ValuePath, ValuePath)> {
        let at = self.0.iter().position(|s| *s == PathSeg::Each)?;
        Some((
            ValuePath(self.0[..at].to_vec()),
            ValuePath(self.0[at + 1..].to_vec()),
        ))
    }

    pub fn segments(&self) -> &[PathSeg] {
        &self.0
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            match seg {
                PathSeg::Field(name) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSeg::Each => f.write_str("[*]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ValuePath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segs = Vec::new();
        for part in s.split('.').filter(|p| !p.is_empty()) {
            let mut rest = part;
            let mut each = 0;
            while let Some(stripped) = rest.strip_suffix("[*]") {
                rest = stripped;
                each += 1;
            }
            if rest.contains(['[', ']']) {
                return Err(format!("malformed value path: {s:?}"));
            }
            if !rest.is_empty() {
                segs.push(PathSeg::Field(rest.to_string()));
            }
            segs.extend(std::iter::repeat_n(PathSeg::Each, each));
        }
        Ok(Self(segs))
    }
}

/// Text encoding used by replacement (blob-redirected) calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlobFormat {
    #[default]
    Json,
    Xml,
}

/// A column of a cursor row or a leaf of a columnar array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Path inside one row; root for scalar rows.
    pub path: ValuePath,
    pub kind: ScalarKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    Scalar(ScalarKind),
    /// Index-by table of scalars; never longer than `capacity`.
    Array { elem: ScalarKind, capacity: usize },
    /// REF CURSOR, fetched lazily in batches.
    Cursor { columns: Vec<Column> },
    /// Serialized whole request or response.
    Blob(BlobFormat),
}

/// Where a slot's input value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotSource {
    /// Convert from the request at the slot's path.
    Convert,
    /// Copy the value already converted for the slot at this index.
    CopyOf(usize),
}

/// One positional bind parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindSlot {
    /// 1-based placeholder number in the block text.
    pub position: usize,
    pub path: ValuePath,
    pub direction: Direction,
    pub kind: SlotKind,
    pub source: SlotSource,
}

/// Everything needed to invoke one function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPlan {
    /// `PACKAGE.NAME` of the wrapped subprogram.
    pub function: String,
    pub ident: String,
    pub block: String,
    pub slots: Vec<BindSlot>,
    pub cursor_batch_size: usize,
    pub lob_spill_threshold: usize,
}

impl CallPlan {
    pub fn slot(&self, index: usize) -> Option<&BindSlot> {
        self.slots.get(index)
    }

    pub fn output_slots(&self) -> impl Iterator<Item = (usize, &BindSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.direction.is_output())
    }
}
