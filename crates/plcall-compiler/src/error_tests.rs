use crate::Error;

#[test]
fn function_scoped_errors_are_skippable() {
    assert!(Error::UnknownType("X".into()).is_skippable());
    assert!(Error::not_supported("T", "index by VARCHAR2").is_skippable());
    assert!(
        Error::MissingElementType {
            function: "PKG.F".into(),
            argument: "P".into(),
        }
        .is_skippable()
    );
    assert!(!Error::InternalConsistency("orphan".into()).is_skippable());
    assert!(!Error::catalog("all_arguments", "connection reset").is_skippable());
}

#[test]
fn messages() {
    let err = Error::not_supported("SCOTT.PKG.T", "index by VARCHAR2");
    assert_eq!(err.to_string(), "SCOTT.PKG.T: not supported: index by VARCHAR2");

    let err = Error::Directive {
        line: 3,
        message: "unknown directive \"renam\"".into(),
    };
    assert_eq!(err.to_string(), "directive line 3: unknown directive \"renam\"");
}
