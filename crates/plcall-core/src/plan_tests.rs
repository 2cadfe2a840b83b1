use crate::plan::{PathSeg, ValuePath};

#[test]
fn path_display() {
    let path = ValuePath::root().field("items").each().field("qty");
    assert_eq!(path.to_string(), "items[*].qty");
    assert_eq!(ValuePath::root().to_string(), "");
}

#[test]
fn path_parse_matches_builder() {
    let parsed: ValuePath = "rec.addr.city".parse().unwrap();
    assert_eq!(
        parsed,
        ValuePath::root().field("rec").field("addr").field("city")
    );

    let parsed: ValuePath = "items[*].qty".parse().unwrap();
    assert_eq!(parsed, ValuePath::root().field("items").each().field("qty"));
}

#[test]
fn path_parse_rejects_bad_brackets() {
    assert!("a[1].b".parse::<ValuePath>().is_err());
}

#[test]
fn split_each_separates_list_and_element() {
    let path = ValuePath::root().field("items").each().field("qty");
    let (list, inner) = path.split_each().unwrap();
    assert_eq!(list, ValuePath::root().field("items"));
    assert_eq!(inner.segments(), &[PathSeg::Field("qty".into())]);

    assert!(ValuePath::root().field("x").split_each().is_none());
}
