use std::fs;
use std::path::Path;

use indoc::indoc;
use plcall_compiler::{Error, GenConfig, SchemaConfig};

use super::check::{self, CheckArgs, Summary};
use super::generate::{self, GenArgs};
use super::pipeline::{self, Inputs};
use super::proto::{self, ProtoArgs};

const ROWS: &str = indoc! {"
    PACKAGE_NAME,OBJECT_NAME,OVERLOAD,DATA_LEVEL,POSITION,ARGUMENT_NAME,IN_OUT,DATA_TYPE,DATA_PRECISION,DATA_SCALE
    HR,GET_NAME,,0,1,P_ID,IN,NUMBER,9,0
    HR,GET_NAME,,0,2,P_NAME,OUT,VARCHAR2,,
    HR,PURGE,,0,1,P_DAYS,IN,NUMBER,4,0
    PAY,RUN,,0,1,P_MONTH,IN,DATE,,
"};

const TYPES: &str = indoc! {"
    PACKAGE_NAME,TYPE_NAME,TYPECODE,ATTR_NO,ATTR_NAME,ATTR_TYPE_NAME,PRECISION,SCALE
    HR,EMP_T,RECORD,2,NAME,VARCHAR2,,
    HR,EMP_T,RECORD,1,ID,NUMBER,9,0
"};

fn inputs(dir: &Path, directives: Option<&str>) -> Inputs {
    let rows_path = dir.join("args.csv");
    fs::write(&rows_path, ROWS).unwrap();
    let directives = directives.map(|text| {
        let path = dir.join("plcall.directives");
        fs::write(&path, text).unwrap();
        path
    });
    Inputs {
        rows_path,
        directives,
        types: None,
        snapshot: None,
        owner: "SCOTT".to_string(),
        only: Vec::new(),
        skip: Vec::new(),
    }
}

#[test]
fn load_groups_functions_per_package() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = pipeline::load(&inputs(dir.path(), None)).unwrap();

    let packages = loaded.by_package();
    let names: Vec<&str> = packages.keys().map(String::as_str).collect();
    assert_eq!(names, ["HR", "PAY"]);
    assert_eq!(packages["HR"].len(), 2);
}

#[test]
fn filters_restrict_loaded_functions() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = inputs(dir.path(), None);
    inputs.only = vec!["hr".to_string()];
    inputs.skip = vec!["HR.PURGE".to_string()];

    let loaded = pipeline::load(&inputs).unwrap();
    assert_eq!(loaded.functions.len(), 1);
    assert_eq!(loaded.functions[0].name, "GET_NAME");
}

#[test]
fn gen_writes_sql_and_glue_per_package() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen");
    let directives = indoc! {"
        # public surface
        rename  HR.GET_NAME=>employee_name
        private HR.PURGE
    "};

    generate::run(GenArgs {
        inputs: inputs(dir.path(), Some(directives)),
        out_dir: Some(out.clone()),
        config: GenConfig::new(),
        write_snapshot: None,
    })
    .unwrap();

    let sql = fs::read_to_string(out.join("hr.sql")).unwrap();
    assert!(sql.starts_with("-- Generated by plcall for package HR. Do not edit."));
    assert!(sql.contains("HR.GET_NAME("));
    assert!(!sql.contains("HR.PURGE"));

    let glue = fs::read_to_string(out.join("hr.rs")).unwrap();
    assert!(glue.contains("pub fn employee_name<"));
    assert!(!glue.contains("purge"));

    assert!(out.join("pay.sql").exists());
    assert!(out.join("pay.rs").exists());
}

#[test]
fn gen_snapshot_carries_type_rows_for_reuse() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("types.json");
    let types = dir.path().join("types.csv");
    fs::write(&types, TYPES).unwrap();
    let mut first = inputs(dir.path(), None);
    first.types = Some(types);

    generate::run(GenArgs {
        inputs: first,
        out_dir: Some(dir.path().join("gen")),
        config: GenConfig::new(),
        write_snapshot: Some(snapshot.clone()),
    })
    .unwrap();

    let text = fs::read_to_string(&snapshot).unwrap();
    assert!(text.contains("\"types\""));
    let reread = pipeline::read_snapshot(&snapshot).unwrap();
    let names: Vec<&str> = reread.types.keys().map(|k| k.as_str()).collect();
    assert_eq!(names, ["SCOTT.HR.EMP_T"]);

    let mut again = inputs(dir.path(), None);
    again.snapshot = Some(snapshot);
    let loaded = pipeline::load(&again).unwrap();
    assert_eq!(loaded.graph.snapshot(), reread);
}

#[test]
fn unknown_typecode_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    let types = dir.path().join("types.csv");
    fs::write(&types, "TYPE_NAME,TYPECODE\nT,VARRAY\n").unwrap();
    let mut inputs = inputs(dir.path(), None);
    inputs.types = Some(types);

    assert!(matches!(
        pipeline::load(&inputs),
        Err(Error::InternalConsistency(_))
    ));
}

#[test]
fn proto_writes_one_file_per_package() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("proto");

    proto::run(ProtoArgs {
        inputs: inputs(dir.path(), None),
        out_dir: Some(out.clone()),
        config: SchemaConfig::new(),
    })
    .unwrap();

    let hr = fs::read_to_string(out.join("hr.proto")).unwrap();
    assert!(hr.starts_with("syntax = \"proto3\";"));
    assert!(hr.contains("rpc GetName (GetNameInput) returns (GetNameOutput) {}"));
    let pay = fs::read_to_string(out.join("pay.proto")).unwrap();
    assert!(pay.contains("google/protobuf/timestamp.proto"));
}

#[test]
fn check_counts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let summary = check::run(CheckArgs {
        inputs: inputs(dir.path(), Some("private PURGE\n")),
        strict: true,
    })
    .unwrap();

    assert_eq!(
        summary,
        Summary {
            packages: 2,
            functions: 2,
            skipped: 0,
        }
    );
    let entries = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 2);
}

#[test]
fn bad_directive_aborts_with_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let err = check::run(CheckArgs {
        inputs: inputs(dir.path(), Some("# header\nfrobnicate HR.GET_NAME\n")),
        strict: false,
    })
    .unwrap_err();

    assert!(matches!(err, Error::Directive { line: 2, .. }));
}

#[test]
fn missing_rows_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut inputs = inputs(dir.path(), None);
    inputs.rows_path = dir.path().join("absent.csv");

    assert!(matches!(pipeline::load(&inputs), Err(Error::Io(_))));
}

#[test]
fn file_stem_lowercases_package() {
    assert_eq!(pipeline::file_stem("HR_API"), "hr_api");
    assert_eq!(pipeline::file_stem(""), "standalone");
}
