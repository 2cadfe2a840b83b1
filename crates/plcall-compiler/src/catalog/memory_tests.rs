use indoc::indoc;
use plcall_core::{QualifiedName, Scalar};

use super::{AttrRow, Catalog, MemoryCatalog, TypeClass, read_type_rows};
use crate::Error;

fn qn(owner: &str, package: Option<&str>, name: &str) -> QualifiedName {
    QualifiedName::new(owner, package, name)
}

#[test]
fn classify_by_registered_shape() {
    let catalog = MemoryCatalog::new("scott")
        .record(
            qn("SCOTT", Some("PKG"), "REC_T"),
            vec![AttrRow::scalar("A", Scalar::new("VARCHAR2"))],
        )
        .collection(
            qn("SCOTT", Some("PKG"), "MAP_T"),
            AttrRow::scalar("", Scalar::new("NUMBER")),
            Some("VARCHAR2"),
        )
        .table("SCOTT", "EMP", vec![AttrRow::scalar("EMPNO", Scalar::new("NUMBER"))]);

    assert_eq!(catalog.default_owner(), "SCOTT");
    assert_eq!(
        catalog.classify(&qn("scott", Some("pkg"), "rec_t")).unwrap(),
        Some(TypeClass::Record)
    );
    assert_eq!(
        catalog.classify(&qn("SCOTT", Some("PKG"), "MAP_T")).unwrap(),
        Some(TypeClass::Collection {
            index_by: Some("VARCHAR2".into())
        })
    );
    assert_eq!(
        catalog
            .classify(&QualifiedName::rowtype("SCOTT", "EMP"))
            .unwrap(),
        Some(TypeClass::Table)
    );
    assert_eq!(catalog.classify(&qn("SCOTT", None, "EMP")).unwrap(), None);
    assert_eq!(catalog.query_count(), 4);
}

#[test]
fn arguments_filter_by_package() {
    let rows = vec![
        crate::test_utils::row("PKG", "F", 0, 1, "P", "IN", "NUMBER"),
        crate::test_utils::row("OTHER", "G", 0, 1, "Q", "IN", "NUMBER"),
    ];
    let catalog = MemoryCatalog::new("SCOTT").with_arguments(rows);

    assert_eq!(catalog.arguments(&[]).unwrap().len(), 2);
    let only = catalog.arguments(&["pkg".to_string()]).unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].object_name, "F");
}

#[test]
fn type_rows_register_each_shape() {
    let input = indoc! {"
        OWNER,PACKAGE_NAME,TYPE_NAME,TYPECODE,INDEX_BY,ATTR_NO,ATTR_NAME,ATTR_TYPE_OWNER,ATTR_TYPE_PACKAGE,ATTR_TYPE_NAME
        ,PKG,REC_T,RECORD,,2,B,,,VARCHAR2
        ,PKG,REC_T,RECORD,,1,A,,,NUMBER
        ,PKG,REC_TAB,COLLECTION,PLS_INTEGER,,,,PKG,REC_T
        ,,EMP,TABLE,,1,EMPNO,,,NUMBER
        SYS,,XMLTYPE,OPAQUE,,,,,,
    "};
    let catalog = MemoryCatalog::new("scott")
        .with_type_rows(read_type_rows(input.as_bytes()).unwrap())
        .unwrap();

    let rec = qn("SCOTT", Some("PKG"), "REC_T");
    assert_eq!(catalog.classify(&rec).unwrap(), Some(TypeClass::Record));
    assert_eq!(
        catalog.record_attributes(&rec).unwrap(),
        [
            AttrRow::scalar("A", Scalar::new("NUMBER")),
            AttrRow::scalar("B", Scalar::new("VARCHAR2")),
        ]
    );
    assert_eq!(
        catalog
            .collection_element(&qn("SCOTT", Some("PKG"), "REC_TAB"))
            .unwrap(),
        Some(AttrRow::named("", rec.clone()))
    );
    assert_eq!(
        catalog.classify(&qn("SCOTT", Some("PKG"), "REC_TAB")).unwrap(),
        Some(TypeClass::Collection {
            index_by: Some("PLS_INTEGER".into())
        })
    );
    assert_eq!(
        catalog
            .rowtype_columns(&QualifiedName::rowtype("SCOTT", "EMP"))
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        catalog.classify(&qn("SYS", None, "XMLTYPE")).unwrap(),
        Some(TypeClass::Opaque)
    );
    assert_eq!(catalog.type_names().unwrap().len(), 3);
}

#[test]
fn collection_needs_exactly_one_element_row() {
    let input = indoc! {"
        TYPE_NAME,TYPECODE,ATTR_NAME,ATTR_TYPE_NAME
        PAIR_T,COLLECTION,,NUMBER
        PAIR_T,COLLECTION,,VARCHAR2
    "};
    let rows = read_type_rows(input.as_bytes()).unwrap();
    let err = MemoryCatalog::new("SCOTT").with_type_rows(rows).unwrap_err();
    assert!(matches!(err, Error::InternalConsistency(_)));

    let rows = read_type_rows("TYPE_NAME,TYPECODE\nT,VARRAY\n".as_bytes()).unwrap();
    assert!(MemoryCatalog::new("SCOTT").with_type_rows(rows).is_err());
}
