use indoc::indoc;
use plcall_core::{BlobFormat, Function};

use super::{Action, apply_directives, parse_directives};
use crate::Error;

fn function(package: &str, name: &str) -> Function {
    Function {
        package: package.into(),
        name: name.into(),
        ..Function::default()
    }
}

#[test]
fn parses_every_directive() {
    let text = indoc! {"
        # overlay for PKG
        rename PKG.GET_EMPLOYEE_DETAILS=>employee

        private   pkg.helper
        replace PKG.LOAD=>PKG.LOAD_XML
        replace_json SEARCH=>SEARCH_JSON
        handle NO_DATA_FOUND
        handle PKG=>pkg.e_locked
        max-table-size PKG.LOAD=>1000
        tag PKG.SEARCH=>readonly
    "};
    let directives = parse_directives(text).unwrap();
    let actions: Vec<&Action> = directives.iter().map(|d| &d.action).collect();

    assert_eq!(directives[0].line, 2);
    assert_eq!(
        actions,
        [
            &Action::Rename {
                target: "PKG.GET_EMPLOYEE_DETAILS".into(),
                to: "employee".into()
            },
            &Action::Private {
                target: "PKG.HELPER".into()
            },
            &Action::Replace {
                target: "PKG.LOAD".into(),
                with: "PKG.LOAD_XML".into(),
                format: BlobFormat::Xml
            },
            &Action::Replace {
                target: "SEARCH".into(),
                with: "SEARCH_JSON".into(),
                format: BlobFormat::Json
            },
            &Action::Handle {
                package: None,
                exception: "NO_DATA_FOUND".into()
            },
            &Action::Handle {
                package: Some("PKG".into()),
                exception: "PKG.E_LOCKED".into()
            },
            &Action::MaxTableSize {
                target: "PKG.LOAD".into(),
                size: 1000
            },
            &Action::Tag {
                target: "PKG.SEARCH".into(),
                tag: "readonly".into()
            },
        ]
    );
}

#[test]
fn malformed_lines_report_their_number() {
    let cases = [
        ("renam PKG.F=>g", 1),
        ("\nrename PKG.F", 2),
        ("max-table-size F=>lots", 1),
        ("max-table-size F=>0", 1),
        ("private F=>G", 1),
        ("tag", 1),
        ("rename F=>", 1),
    ];
    for (text, line) in cases {
        match parse_directives(text) {
            Err(Error::Directive { line: got, .. }) => assert_eq!(got, line, "{text:?}"),
            other => panic!("{text:?}: expected directive error, got {other:?}"),
        }
    }
}

#[test]
fn overlay_renames_hides_and_redirects() {
    let functions = vec![
        function("PKG", "LOAD"),
        function("PKG", "LOAD_XML"),
        function("PKG", "SEARCH"),
        function("OTHER", "PING"),
    ];
    let directives = parse_directives(indoc! {"
        rename pkg.search=>find
        replace PKG.LOAD=>PKG.LOAD_XML
        private PKG.LOAD_XML
        handle NO_DATA_FOUND
        handle PKG=>PKG.E_LOCKED
        max-table-size LOAD=>4
        tag SEARCH=>readonly
        tag SEARCH=>readonly
    "})
    .unwrap();

    let out = apply_directives(functions, &directives).unwrap();
    let names: Vec<String> = out.iter().map(|f| f.qualified_name()).collect();
    assert_eq!(names, ["PKG.LOAD", "PKG.SEARCH", "OTHER.PING"]);

    let load = &out[0];
    let replacement = load.replacement.as_ref().unwrap();
    assert_eq!(replacement.function.name, "LOAD_XML");
    assert_eq!(replacement.format, BlobFormat::Xml);
    assert_eq!(load.max_table_size, Some(4));
    assert_eq!(load.handles, ["NO_DATA_FOUND", "PKG.E_LOCKED"]);

    let search = &out[1];
    assert_eq!(search.ident(), "find");
    assert_eq!(search.tags, ["readonly"]);

    assert_eq!(out[2].handles, ["NO_DATA_FOUND"]);
}

#[test]
fn missing_replacement_is_an_error() {
    let directives = parse_directives("replace_json F=>G").unwrap();
    let err = apply_directives(vec![function("PKG", "F")], &directives).unwrap_err();
    assert!(matches!(err, Error::Directive { line: 1, .. }));
}

#[test]
fn unmatched_directive_is_not_fatal() {
    let directives = parse_directives("rename NOBODY=>x").unwrap();
    let out = apply_directives(vec![function("PKG", "F")], &directives).unwrap();
    assert_eq!(out[0].alias, None);
}
