use std::io::Read;

use plcall_core::ScalarKind;

use crate::lob::{materialize, spill_if_large};
use crate::value::Value;

#[test]
fn small_clob_stays_in_memory() {
    let value = materialize("hello".as_bytes(), ScalarKind::Clob, 16).unwrap();
    assert_eq!(value, Value::Text("hello".into()));

    let value = materialize(&[0xffu8, 0x00][..], ScalarKind::Blob, 16).unwrap();
    assert_eq!(value, Value::Bytes(vec![0xff, 0x00]));
}

#[test]
fn threshold_is_inclusive() {
    let value = materialize(&[7u8; 8][..], ScalarKind::Blob, 8).unwrap();
    assert_eq!(value, Value::Bytes(vec![7; 8]));
}

#[test]
fn large_lob_spills_to_temp_file() {
    let data = "x".repeat(100);
    let value = materialize(data.as_bytes(), ScalarKind::Clob, 10).unwrap();

    let Value::Spilled(lob) = &value else {
        panic!("expected spilled lob, got {value:?}");
    };
    assert_eq!(lob.len(), 100);
    let mut contents = String::new();
    lob.open().unwrap().read_to_string(&mut contents).unwrap();
    assert_eq!(contents, data);

    let path = lob.path().to_path_buf();
    assert!(path.exists());
    drop(value);
    assert!(!path.exists());
}

#[test]
fn invalid_utf8_clob_is_rejected() {
    assert!(materialize(&[0xffu8, 0xfe][..], ScalarKind::Clob, 16).is_err());
}

#[test]
fn spill_if_large_only_touches_big_values() {
    let small = spill_if_large(Value::Text("abc".into()), 3).unwrap();
    assert_eq!(small, Value::Text("abc".into()));

    let big = spill_if_large(Value::Bytes(vec![1; 4]), 3).unwrap();
    assert!(matches!(big, Value::Spilled(ref lob) if lob.len() == 4));

    assert_eq!(spill_if_large(Value::Int(1), 0).unwrap(), Value::Int(1));
}
