//! LOB materialization.
//!
//! Small LOBs become plain text or bytes. Anything larger than the spill
//! threshold is streamed into a temp file and returned as
//! [`Value::Spilled`], so a response never holds more than the threshold
//! per LOB in memory.

use std::io::{self, Read, Write};
use std::sync::Arc;

use plcall_core::ScalarKind;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, RuntimeError};
use crate::value::{SpilledLob, Value};

/// Read a LOB stream into a value of `kind` (`Clob` or `Blob`).
pub fn materialize(mut reader: impl Read, kind: ScalarKind, threshold: usize) -> Result<Value> {
    let mut head = Vec::new();
    (&mut reader)
        .take(threshold as u64 + 1)
        .read_to_end(&mut head)?;

    if head.len() <= threshold {
        return in_memory(head, kind);
    }

    let mut file = NamedTempFile::new()?;
    file.write_all(&head)?;
    let rest = io::copy(&mut reader, &mut file)?;
    file.flush()?;
    let len = head.len() as u64 + rest;
    let path = file.into_temp_path();
    debug!(len, path = %path.display(), "spilled LOB to temp file");
    Ok(Value::Spilled(SpilledLob {
        path: Arc::new(path),
        len,
    }))
}

/// Spill an in-memory value that exceeds the threshold.
pub fn spill_if_large(value: Value, threshold: usize) -> Result<Value> {
    let bytes: &[u8] = match &value {
        Value::Text(s) => s.as_bytes(),
        Value::Bytes(b) => b,
        _ => &[],
    };
    if bytes.len() <= threshold {
        return Ok(value);
    }
    materialize(bytes, ScalarKind::Blob, threshold)
}

fn in_memory(bytes: Vec<u8>, kind: ScalarKind) -> Result<Value> {
    match kind {
        ScalarKind::Clob => String::from_utf8(bytes)
            .map(Value::Text)
            .map_err(|_| RuntimeError::convert("lob", "utf-8 text", "invalid utf-8")),
        _ => Ok(Value::Bytes(bytes)),
    }
}
