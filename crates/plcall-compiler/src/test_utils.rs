//! Row and catalog fixtures shared by compiler tests.

use plcall_core::{QualifiedName, Scalar};

use crate::catalog::{ArgRow, AttrRow, MemoryCatalog};

pub fn row(
    package: &str,
    object: &str,
    level: u8,
    position: u32,
    name: &str,
    in_out: &str,
    data_type: &str,
) -> ArgRow {
    ArgRow {
        package_name: package.into(),
        object_name: object.into(),
        data_level: level,
        position,
        argument_name: name.into(),
        in_out: in_out.into(),
        data_type: data_type.into(),
        ..ArgRow::default()
    }
}

/// Attach a package type reference (`SCOTT.<package>.<name>`).
pub fn typed(mut row: ArgRow, package: &str, name: &str) -> ArgRow {
    row.type_owner = "SCOTT".into();
    row.type_name = package.into();
    row.type_subname = name.into();
    row
}

pub fn sized(mut row: ArgRow, length: u32) -> ArgRow {
    row.char_length = Some(length);
    row
}

pub fn numeric(mut row: ArgRow, precision: u8, scale: i8) -> ArgRow {
    row.data_precision = Some(precision);
    row.data_scale = Some(scale);
    row
}

pub fn qn(owner: &str, package: Option<&str>, name: &str) -> QualifiedName {
    QualifiedName::new(owner, package, name)
}

/// `SCOTT` schema with an employee record, a table of it, a `%ROWTYPE`
/// source with the same columns, and a self-referencing node type.
pub fn scott_catalog() -> MemoryCatalog {
    let emp_fields = || {
        vec![
            AttrRow::scalar("EMPNO", Scalar::new("NUMBER").with_precision(4, 0)),
            AttrRow::scalar("ENAME", Scalar::new("VARCHAR2").with_length(10)),
            AttrRow::scalar("HIREDATE", Scalar::new("DATE")),
        ]
    };
    MemoryCatalog::new("SCOTT")
        .record(qn("SCOTT", Some("PKG"), "EMP_REC"), emp_fields())
        .collection(
            qn("SCOTT", Some("PKG"), "EMP_TAB"),
            AttrRow::named("", qn("SCOTT", Some("PKG"), "EMP_REC")),
            Some("BINARY_INTEGER"),
        )
        .collection(
            qn("SCOTT", Some("PKG"), "NAME_MAP"),
            AttrRow::scalar("", Scalar::new("VARCHAR2").with_length(30)),
            Some("VARCHAR2"),
        )
        .record(
            qn("SCOTT", None, "NODE_T"),
            vec![
                AttrRow::scalar("VAL", Scalar::new("VARCHAR2").with_length(20)),
                AttrRow::named("NEXT", qn("SCOTT", None, "NODE_T")),
            ],
        )
        .opaque(qn("SYS", None, "XMLTYPE"))
        .table("SCOTT", "EMP", emp_fields())
}
