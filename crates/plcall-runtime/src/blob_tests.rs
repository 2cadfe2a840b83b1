use plcall_core::BlobFormat;

use crate::blob::{decode, encode};
use crate::value::Value;

fn order() -> Value {
    Value::object()
        .with("id", Value::Int(7))
        .with(
            "tags",
            Value::List(vec![Value::Text("a".into()), Value::Text("b<c".into())]),
        )
        .with("note", Value::Null)
}

#[test]
fn json_encoding_keeps_field_order() {
    let text = encode(&order(), BlobFormat::Json).unwrap();
    assert_eq!(text, r#"{"id":7,"tags":["a","b<c"],"note":null}"#);

    let decoded = decode(&text, BlobFormat::Json).unwrap();
    assert_eq!(decoded.get("id"), Some(&Value::Int(7)));
    assert_eq!(decoded.get("note"), Some(&Value::Null));
}

#[test]
fn xml_encoding() {
    let text = encode(&order(), BlobFormat::Xml).unwrap();
    insta::assert_snapshot!(text, @r#"<data><id>7</id><tags list="true"><item>a</item><item>b&lt;c</item></tags><note/></data>"#);
}

#[test]
fn xml_decoding_yields_text_leaves_and_lists() {
    let text = "<?xml version=\"1.0\"?>\n<data>\n  <id>7</id>\n  <tags><item>a</item><item>b&lt;c</item></tags>\n  <note/>\n</data>";
    let decoded = decode(text, BlobFormat::Xml).unwrap();

    assert_eq!(
        decoded,
        Value::object()
            .with("id", Value::Text("7".into()))
            .with(
                "tags",
                Value::List(vec![Value::Text("a".into()), Value::Text("b<c".into())])
            )
            .with("note", Value::Null)
    );
}

#[test]
fn malformed_blobs_are_errors() {
    assert!(decode("{", BlobFormat::Json).is_err());
    assert!(decode("<data><id>1</data>", BlobFormat::Xml).is_err());
    assert!(decode("", BlobFormat::Xml).is_err());
    assert!(decode("<a/><b/>", BlobFormat::Xml).is_err());
}

#[test]
fn xml_keeps_empty_lists_and_item_fields_apart() {
    let value = Value::object()
        .with("empty", Value::List(vec![]))
        .with("one", Value::List(vec![Value::Text("x".into())]))
        .with("wrapper", Value::object().with("item", Value::Text("y".into())))
        .with("note", Value::Null);

    let text = encode(&value, BlobFormat::Xml).unwrap();
    insta::assert_snapshot!(text, @r#"<data><empty list="true"/><one list="true"><item>x</item></one><wrapper><item>y</item></wrapper><note/></data>"#);
    assert_eq!(decode(&text, BlobFormat::Xml).unwrap(), value);
}
