//! Bounded-batch iteration over REF CURSOR results.

use std::fmt;
use std::time::Instant;

use plcall_core::{CancelToken, ScalarKind, ValuePath};
use tracing::{debug, warn};

use crate::convert::coerce;
use crate::error::{Result, RuntimeError};
use crate::exec::CallOptions;
use crate::value::Value;

/// Driver-side open cursor.
pub trait RowCursor: Send {
    /// Fetch up to `max_rows` rows, one value per column. Fewer rows than
    /// requested means the cursor is exhausted.
    fn fetch(&mut self, max_rows: usize) -> Result<Vec<Vec<Value>>>;

    fn close(&mut self) -> Result<()>;
}

/// Iterator over cursor rows, `batch_size` at a time.
///
/// Each `next` fetches at most one batch and converts its rows into records
/// shaped by the column paths. A short batch ends the iteration. The cursor
/// is closed when iteration ends, fails, is cancelled, or the iterator is
/// dropped.
pub struct CursorBatches {
    cursor: Option<Box<dyn RowCursor>>,
    columns: Vec<(ValuePath, ScalarKind)>,
    batch_size: usize,
    deadline: Option<Instant>,
    cancel: CancelToken,
    rows: usize,
}

impl fmt::Debug for CursorBatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorBatches")
            .field("open", &self.cursor.is_some())
            .field("columns", &self.columns)
            .field("batch_size", &self.batch_size)
            .field("rows", &self.rows)
            .finish()
    }
}

impl CursorBatches {
    pub fn new(
        cursor: Box<dyn RowCursor>,
        columns: Vec<(ValuePath, ScalarKind)>,
        batch_size: usize,
        options: &CallOptions,
    ) -> Self {
        Self {
            cursor: Some(cursor),
            columns,
            batch_size: batch_size.max(1),
            deadline: options.deadline,
            cancel: options.cancel.clone(),
            rows: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Rows delivered so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Drain the remaining batches into one list.
    pub fn collect_rows(&mut self) -> Result<Vec<Value>> {
        let mut all = Vec::new();
        for batch in self.by_ref() {
            all.extend(batch?);
        }
        Ok(all)
    }

    fn close(&mut self) -> Result<()> {
        match self.cursor.take() {
            Some(mut cursor) => {
                debug!(rows = self.rows, "closing cursor");
                cursor.close()
            }
            None => Ok(()),
        }
    }

    fn record(&self, row: Vec<Value>) -> Result<Value> {
        if row.len() != self.columns.len() {
            return Err(RuntimeError::convert(
                "cursor row",
                "one value per column",
                format!("{} values for {} columns", row.len(), self.columns.len()),
            ));
        }
        let mut record = Value::Null;
        for ((path, kind), value) in self.columns.iter().zip(row) {
            let value = coerce(&value, *kind, &path.to_string())?;
            record.set(path, value);
        }
        Ok(record)
    }

    fn next_batch(&mut self) -> Result<Option<Vec<Value>>> {
        if self.cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RuntimeError::DeadlineExceeded);
        }
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        let rows = cursor.fetch(self.batch_size)?;
        let exhausted = rows.len() < self.batch_size;
        let batch = rows
            .into_iter()
            .map(|row| self.record(row))
            .collect::<Result<Vec<_>>>()?;
        self.rows += batch.len();
        if exhausted {
            self.close()?;
        }
        Ok((!batch.is_empty()).then_some(batch))
    }
}

impl Iterator for CursorBatches {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.as_ref()?;
        match self.next_batch() {
            Ok(batch) => batch.map(Ok),
            Err(err) => {
                if let Err(close_err) = self.close() {
                    warn!(error = %close_err, "closing cursor after failure");
                }
                Some(Err(err))
            }
        }
    }
}

impl Drop for CursorBatches {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "closing dropped cursor");
        }
    }
}
