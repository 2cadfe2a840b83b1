use std::time::{Duration, Instant};

use plcall_core::{CancelToken, ScalarKind, ValuePath};

use crate::cursor::CursorBatches;
use crate::error::RuntimeError;
use crate::exec::CallOptions;
use crate::test_utils::VecCursor;
use crate::value::Value;

fn rows(n: i64) -> Vec<Vec<Value>> {
    (1..=n).map(|i| vec![Value::Int(i)]).collect()
}

fn scalar_column() -> Vec<(ValuePath, ScalarKind)> {
    vec![(ValuePath::root(), ScalarKind::Int)]
}

#[test]
fn short_batch_ends_iteration() {
    let (cursor, tracker) = VecCursor::new(rows(5));
    let batches = CursorBatches::new(Box::new(cursor), scalar_column(), 2, &CallOptions::new());

    let sizes: Vec<usize> = batches.map(|b| b.unwrap().len()).collect();
    assert_eq!(sizes, [2, 2, 1]);
    assert_eq!(tracker.fetches(), 3);
    assert!(tracker.closed());
}

#[test]
fn exact_multiple_needs_one_empty_fetch() {
    let (cursor, tracker) = VecCursor::new(rows(4));
    let mut batches =
        CursorBatches::new(Box::new(cursor), scalar_column(), 2, &CallOptions::new());

    assert_eq!(
        batches.next().unwrap().unwrap(),
        [Value::Int(1), Value::Int(2)]
    );
    assert_eq!(batches.next().unwrap().unwrap().len(), 2);
    assert!(!tracker.closed());
    assert!(batches.next().is_none());
    assert!(tracker.closed());
    assert_eq!(tracker.fetches(), 3);
    assert_eq!(batches.rows(), 4);
}

#[test]
fn rows_are_shaped_by_column_paths() {
    let (cursor, _) = VecCursor::new(vec![vec![
        Value::Text("7839".into()),
        Value::Text("KING".into()),
    ]]);
    let columns = vec![
        ("empno".parse().unwrap(), ScalarKind::Int),
        ("ename".parse().unwrap(), ScalarKind::Text),
    ];
    let mut batches = CursorBatches::new(Box::new(cursor), columns, 10, &CallOptions::new());

    assert_eq!(
        batches.collect_rows().unwrap(),
        [Value::object()
            .with("empno", Value::Int(7839))
            .with("ename", Value::Text("KING".into()))]
    );
}

#[test]
fn cancellation_between_batches_closes_cursor() {
    let cancel = CancelToken::new();
    let (cursor, tracker) = VecCursor::new(rows(10));
    let options = CallOptions::new().cancel(cancel.clone());
    let mut batches = CursorBatches::new(Box::new(cursor), scalar_column(), 3, &options);

    assert!(batches.next().unwrap().is_ok());
    cancel.cancel();
    assert!(matches!(
        batches.next().unwrap(),
        Err(RuntimeError::Cancelled)
    ));
    assert!(tracker.closed());
    assert!(batches.next().is_none());
    assert_eq!(tracker.fetches(), 1);
}

#[test]
fn expired_deadline_stops_fetching() {
    let (cursor, tracker) = VecCursor::new(rows(3));
    let options = CallOptions::new().deadline(Instant::now() - Duration::from_millis(1));
    let mut batches = CursorBatches::new(Box::new(cursor), scalar_column(), 2, &options);

    assert!(matches!(
        batches.next().unwrap(),
        Err(RuntimeError::DeadlineExceeded)
    ));
    assert_eq!(tracker.fetches(), 0);
    assert!(tracker.closed());
}

#[test]
fn drop_closes_open_cursor() {
    let (cursor, tracker) = VecCursor::new(rows(10));
    let mut batches =
        CursorBatches::new(Box::new(cursor), scalar_column(), 2, &CallOptions::new());
    batches.next();
    assert!(!tracker.closed());
    drop(batches);
    assert!(tracker.closed());
}

#[test]
fn wrong_column_count_is_an_error() {
    let (cursor, tracker) = VecCursor::new(vec![vec![Value::Int(1), Value::Int(2)]]);
    let mut batches =
        CursorBatches::new(Box::new(cursor), scalar_column(), 2, &CallOptions::new());
    assert!(batches.next().unwrap().is_err());
    assert!(tracker.closed());
}
