//! In-memory driver fakes shared by runtime tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use plcall_core::{ArgType, Argument, Direction, Function, Scalar};

use crate::bind::Bind;
use crate::cursor::RowCursor;
use crate::error::Result;
use crate::exec::Executor;
use crate::value::Value;

/// Executor that records each block and lets a closure play the database.
pub struct ScriptedExecutor<F> {
    pub blocks: Vec<String>,
    script: F,
}

pub fn scripted<F>(script: F) -> ScriptedExecutor<F>
where
    F: FnMut(&mut [Bind]) -> Result<()>,
{
    ScriptedExecutor {
        blocks: Vec::new(),
        script,
    }
}

impl<F> Executor for ScriptedExecutor<F>
where
    F: FnMut(&mut [Bind]) -> Result<()>,
{
    fn execute(&mut self, block: &str, binds: &mut [Bind], _deadline: Option<Instant>) -> Result<()> {
        self.blocks.push(block.to_string());
        (self.script)(binds)
    }
}

/// Write `value` into output bind `index`.
pub fn set_out(binds: &mut [Bind], index: usize, value: Value) {
    binds[index].out_mut().expect("output bind").value = value;
}

/// Shared view of a [`VecCursor`] after it was handed to the runtime.
#[derive(Clone, Default)]
pub struct CursorTracker {
    pub fetches: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl CursorTracker {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct VecCursor {
    rows: VecDeque<Vec<Value>>,
    tracker: CursorTracker,
}

impl VecCursor {
    pub fn new(rows: Vec<Vec<Value>>) -> (Self, CursorTracker) {
        let tracker = CursorTracker::default();
        let cursor = Self {
            rows: rows.into(),
            tracker: tracker.clone(),
        };
        (cursor, tracker)
    }
}

impl RowCursor for VecCursor {
    fn fetch(&mut self, max_rows: usize) -> Result<Vec<Vec<Value>>> {
        self.tracker.fetches.fetch_add(1, Ordering::SeqCst);
        let n = max_rows.min(self.rows.len());
        Ok(self.rows.drain(..n).collect())
    }

    fn close(&mut self) -> Result<()> {
        self.tracker.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn ints(values: impl IntoIterator<Item = i64>) -> Value {
    Value::List(values.into_iter().map(Value::Int).collect())
}

pub fn simple(name: &str, direction: Direction, scalar: Scalar) -> Argument {
    Argument::new(name, direction, ArgType::Simple(scalar))
}

pub fn table(name: &str, direction: Direction, type_name: &str, elem: Argument) -> Argument {
    Argument::new(
        name,
        direction,
        ArgType::Table {
            type_name: Some(type_name.into()),
            elem: Some(Box::new(elem)),
            nested: false,
            cursor: false,
        },
    )
}

pub fn record(name: &str, direction: Direction, type_name: &str, fields: Vec<Argument>) -> Argument {
    Argument::new(
        name,
        direction,
        ArgType::Record {
            type_name: Some(type_name.into()),
            fields,
        },
    )
}

pub fn function(name: &str, args: Vec<Argument>, returns: Option<Argument>) -> Function {
    Function {
        package: "PKG".into(),
        name: name.into(),
        args,
        returns,
        ..Function::default()
    }
}
