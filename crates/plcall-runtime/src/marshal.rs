//! Bind construction and output collection.
//!
//! Generated glue calls these functions slot by slot; [`invoke`] runs the
//! same steps straight from a [`CallPlan`]. Paths are the textual
//! [`ValuePath`] form (`p_order.items[*].qty`).

use std::io::Read;

use plcall_core::{
    BlobFormat, CallPlan, Direction, RETURN_FIELD, ScalarKind, SlotKind, SlotSource, ValuePath,
};
use tracing::{debug, warn};

use crate::bind::{Bind, OutBox, Stream};
use crate::blob;
use crate::convert::coerce;
use crate::cursor::CursorBatches;
use crate::error::{Result, RuntimeError};
use crate::exec::{CallOptions, Executor};
use crate::lob;
use crate::value::Value;

/// Result of one call: the response tree plus any open cursors, keyed by
/// their path in the tree.
#[derive(Debug)]
pub struct Response {
    pub value: Value,
    pub cursors: Vec<(String, CursorBatches)>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            value: Value::object(),
            cursors: Vec::new(),
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every cursor into its place in the tree.
    pub fn into_value(mut self) -> Result<Value> {
        for (path, mut cursor) in std::mem::take(&mut self.cursors) {
            let rows = cursor.collect_rows()?;
            self.value.set(&parse_path(&path)?, Value::List(rows));
        }
        Ok(self.value)
    }
}

fn parse_path(path: &str) -> Result<ValuePath> {
    path.parse::<ValuePath>()
        .map_err(|message: String| RuntimeError::convert(path, "value path", message))
}

fn request_scalar(req: &Value, path: &str, kind: ScalarKind) -> Result<Value> {
    let parsed = parse_path(path)?;
    match req.lookup(&parsed) {
        Some(value) => coerce(value, kind, path),
        None => Ok(Value::Null),
    }
}

fn request_array(req: &Value, path: &str, kind: ScalarKind, capacity: usize) -> Result<Value> {
    let parsed = parse_path(path)?;
    let column = req
        .column(&parsed)
        .ok_or_else(|| RuntimeError::convert(path, "list", "non-list value"))?;
    if column.len() > capacity {
        warn!(path, len = column.len(), capacity, "truncating input array");
    }
    let values = column
        .into_iter()
        .take(capacity)
        .map(|value| coerce(value, kind, path))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::List(values))
}

pub fn scalar_in(req: &Value, path: &str, kind: ScalarKind) -> Result<Bind> {
    Ok(Bind::In(request_scalar(req, path, kind)?))
}

pub fn scalar_inout(req: &Value, path: &str, kind: ScalarKind) -> Result<Bind> {
    Ok(Bind::Out(OutBox::new(request_scalar(req, path, kind)?, None)))
}

/// Column of an input table, truncated to `capacity` elements.
pub fn array_in(req: &Value, path: &str, kind: ScalarKind, capacity: usize) -> Result<Bind> {
    Ok(Bind::In(request_array(req, path, kind, capacity)?))
}

pub fn array_inout(req: &Value, path: &str, kind: ScalarKind, capacity: usize) -> Result<Bind> {
    let values = request_array(req, path, kind, capacity)?;
    Ok(Bind::Out(OutBox::new(values, Some(capacity))))
}

pub fn array_out(capacity: usize) -> Bind {
    Bind::Out(OutBox::new(Value::Null, Some(capacity)))
}

pub fn output() -> Bind {
    Bind::Out(OutBox::default())
}

pub fn blob_in(req: &Value, format: BlobFormat) -> Result<Bind> {
    Ok(Bind::In(Value::Text(blob::encode(req, format)?)))
}

pub fn blob_inout(req: &Value, format: BlobFormat) -> Result<Bind> {
    let text = blob::encode(req, format)?;
    Ok(Bind::Out(OutBox::new(Value::Text(text), None)))
}

/// Input bind carrying the same value as an earlier slot.
pub fn copy_in(first: &Bind) -> Bind {
    Bind::In(first.value().clone())
}

/// Output bind that starts from an earlier slot's value.
pub fn copy_out(first: &Bind, capacity: Option<usize>) -> Bind {
    Bind::Out(OutBox::new(first.value().clone(), capacity))
}

pub fn collect_scalar(resp: &mut Response, bind: &Bind, path: &str, kind: ScalarKind) -> Result<()> {
    let value = coerce(bind.value(), kind, path)?;
    resp.value.set(&parse_path(path)?, value);
    Ok(())
}

/// LOB output, read from the driver's stream when there is one.
pub fn collect_lob(
    resp: &mut Response,
    bind: &mut Bind,
    path: &str,
    kind: ScalarKind,
    threshold: usize,
) -> Result<()> {
    let value = match bind.out_mut().and_then(|out| out.stream.take()) {
        Some(Stream::Lob(reader)) => lob::materialize(reader, kind, threshold)?,
        Some(Stream::Cursor(_)) => {
            return Err(RuntimeError::convert(path, "lob", "cursor"));
        }
        None => lob::spill_if_large(coerce(bind.value(), kind, path)?, threshold)?,
    };
    resp.value.set(&parse_path(path)?, value);
    Ok(())
}

pub fn collect_array(resp: &mut Response, bind: &Bind, path: &str, kind: ScalarKind) -> Result<()> {
    let items = match bind.value() {
        Value::Null => Vec::new(),
        Value::List(items) => items.iter().collect::<Vec<_>>(),
        other => return Err(RuntimeError::convert(path, "list", other.kind_name())),
    };
    let capacity = bind.capacity().unwrap_or(usize::MAX);
    if items.len() > capacity {
        warn!(path, len = items.len(), capacity, "driver returned more elements than capacity");
    }
    let values = items
        .into_iter()
        .take(capacity)
        .map(|value| coerce(value, kind, path))
        .collect::<Result<Vec<_>>>()?;
    resp.value.set_column(&parse_path(path)?, values);
    Ok(())
}

/// Hand a returned REF CURSOR to the response as a batch iterator.
///
/// A null cursor yields an empty list in the tree instead.
pub fn collect_cursor(
    resp: &mut Response,
    bind: &mut Bind,
    path: &str,
    columns: &[(&str, ScalarKind)],
    batch_size: usize,
    opts: &CallOptions,
) -> Result<()> {
    let columns = columns
        .iter()
        .map(|(column, kind)| Ok((parse_path(column)?, *kind)))
        .collect::<Result<Vec<_>>>()?;
    match bind.out_mut().and_then(|out| out.stream.take()) {
        Some(Stream::Cursor(cursor)) => {
            let batches = CursorBatches::new(cursor, columns, batch_size, opts);
            resp.cursors.push((path.to_string(), batches));
        }
        Some(Stream::Lob(_)) => return Err(RuntimeError::convert(path, "cursor", "lob")),
        None if bind.value().is_null() => {
            resp.value.set(&parse_path(path)?, Value::List(Vec::new()));
        }
        None => {
            return Err(RuntimeError::convert(path, "cursor", bind.value().kind_name()));
        }
    }
    Ok(())
}

/// Merge a decoded response blob into the tree.
pub fn collect_blob(resp: &mut Response, bind: &Bind, format: BlobFormat) -> Result<()> {
    let decoded = match bind.value() {
        Value::Null => return Ok(()),
        Value::Text(text) => blob::decode(text, format)?,
        Value::Bytes(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| RuntimeError::blob(format, e))?;
            blob::decode(text, format)?
        }
        Value::Spilled(lob) => {
            let mut text = String::new();
            lob.open()?.read_to_string(&mut text)?;
            blob::decode(&text, format)?
        }
        other => return Err(RuntimeError::blob(format, format!("unexpected {}", other.kind_name()))),
    };
    match decoded {
        Value::Object(fields) => {
            for (field, value) in fields {
                resp.value.set(&ValuePath::root().field(&field), value);
            }
        }
        Value::Null => {}
        other => resp.value.set(&ValuePath::root().field(RETURN_FIELD), other),
    }
    Ok(())
}

fn build_bind(plan: &CallPlan, binds: &[Bind], index: usize, req: &Value) -> Result<Bind> {
    let slot = &plan.slots[index];
    let path = slot.path.to_string();
    let capacity = match slot.kind {
        SlotKind::Array { capacity, .. } => Some(capacity),
        _ => None,
    };

    if let SlotSource::CopyOf(first) = slot.source {
        let first = binds.get(first).ok_or_else(|| RuntimeError::Bind {
            index,
            message: format!("copies slot {first}, which is not built yet"),
        })?;
        return Ok(match slot.direction {
            Direction::In => copy_in(first),
            _ => copy_out(first, capacity),
        });
    }

    Ok(match (&slot.kind, slot.direction) {
        (SlotKind::Array { capacity, .. }, Direction::Out) => array_out(*capacity),
        (_, Direction::Out) | (SlotKind::Cursor { .. }, _) => output(),
        (SlotKind::Scalar(kind), Direction::In) => scalar_in(req, &path, *kind)?,
        (SlotKind::Scalar(kind), Direction::InOut) => scalar_inout(req, &path, *kind)?,
        (SlotKind::Array { elem, capacity }, Direction::In) => {
            array_in(req, &path, *elem, *capacity)?
        }
        (SlotKind::Array { elem, capacity }, Direction::InOut) => {
            array_inout(req, &path, *elem, *capacity)?
        }
        (SlotKind::Blob(format), Direction::In) => blob_in(req, *format)?,
        (SlotKind::Blob(format), Direction::InOut) => blob_inout(req, *format)?,
    })
}

/// Run a call plan directly, without generated glue.
pub fn invoke<E: Executor + ?Sized>(
    plan: &CallPlan,
    exec: &mut E,
    req: &Value,
    opts: &CallOptions,
) -> Result<Response> {
    opts.check()?;
    let mut binds = Vec::with_capacity(plan.slots.len());
    for index in 0..plan.slots.len() {
        let bind = build_bind(plan, &binds, index, req)?;
        binds.push(bind);
    }

    exec.execute(&plan.block, &mut binds, opts.deadline)?;

    let mut resp = Response::new();
    for (index, slot) in plan.output_slots() {
        let path = slot.path.to_string();
        let bind = &mut binds[index];
        match &slot.kind {
            SlotKind::Scalar(kind) if kind.is_lob() => {
                collect_lob(&mut resp, bind, &path, *kind, plan.lob_spill_threshold)?
            }
            SlotKind::Scalar(kind) => collect_scalar(&mut resp, bind, &path, *kind)?,
            SlotKind::Array { elem, .. } => collect_array(&mut resp, bind, &path, *elem)?,
            SlotKind::Cursor { columns } => {
                let columns: Vec<(String, ScalarKind)> = columns
                    .iter()
                    .map(|c| (c.path.to_string(), c.kind))
                    .collect();
                let columns: Vec<(&str, ScalarKind)> =
                    columns.iter().map(|(p, k)| (p.as_str(), *k)).collect();
                collect_cursor(
                    &mut resp,
                    bind,
                    &path,
                    &columns,
                    plan.cursor_batch_size,
                    opts,
                )?
            }
            SlotKind::Blob(format) => collect_blob(&mut resp, bind, *format)?,
        }
    }
    debug!(function = %plan.function, slots = plan.slots.len(), "call completed");
    Ok(resp)
}
