use std::path::PathBuf;

use super::commands::{build_cli, check_command, gen_command, proto_command};
use super::*;
use crate::commands::generate::GenArgs;
use crate::commands::proto::ProtoArgs;

#[test]
fn gen_extracts_inputs_and_limits() {
    let m = gen_command()
        .try_get_matches_from([
            "gen",
            "args.csv",
            "-d",
            "plcall.directives",
            "-t",
            "types.csv",
            "-p",
            "HR",
            "-p",
            "PAY.RUN",
            "--max-table-size",
            "1000",
            "-o",
            "out",
        ])
        .unwrap();
    let params = GenParams::from_matches(&m);

    assert_eq!(params.inputs.rows_path, PathBuf::from("args.csv"));
    assert_eq!(
        params.inputs.directives,
        Some(PathBuf::from("plcall.directives"))
    );
    assert_eq!(params.inputs.types, Some(PathBuf::from("types.csv")));
    assert_eq!(params.inputs.snapshot, None);
    assert_eq!(params.inputs.only, ["HR", "PAY.RUN"]);
    assert!(params.inputs.skip.is_empty());
    assert_eq!(params.inputs.owner, "PUBLIC");
    assert_eq!(params.max_table_size, Some(1000));
    assert_eq!(params.batch_size, None);
    assert_eq!(params.out_dir, Some(PathBuf::from("out")));

    let args: GenArgs = params.into();
    let config = format!("{:?}", args.config);
    assert!(config.contains("max_table_size: 1000"));
    assert!(config.contains("cursor_batch_size: 128"));
}

#[test]
fn rows_path_is_required() {
    assert!(gen_command().try_get_matches_from(["gen"]).is_err());
    assert!(check_command().try_get_matches_from(["check"]).is_err());
}

#[test]
fn non_numeric_limit_is_rejected() {
    let result = gen_command().try_get_matches_from(["gen", "a.csv", "--batch-size", "many"]);
    assert!(result.is_err());
}

#[test]
fn proto_flags_map_onto_schema_config() {
    let m = proto_command()
        .try_get_matches_from(["proto", "a.csv", "--unary", "--proto-package", "acme.hr"])
        .unwrap();
    let args: ProtoArgs = ProtoParams::from_matches(&m).into();

    let config = format!("{:?}", args.config);
    assert!(config.contains("stream_cursors: false"));
    assert!(config.contains("catalog_types: true"));
    assert!(config.contains(r#"proto_package: Some("acme.hr")"#));
}

#[test]
fn check_reads_strict_and_skip() {
    let m = check_command()
        .try_get_matches_from(["check", "-", "--strict", "--skip", "HR.PURGE", "--owner", "SCOTT"])
        .unwrap();
    let params = CheckParams::from_matches(&m);

    assert!(params.strict);
    assert_eq!(params.inputs.rows_path, PathBuf::from("-"));
    assert_eq!(params.inputs.skip, ["HR.PURGE"]);
    assert_eq!(params.inputs.owner, "SCOTT");
}

fn level(argv: &[&str]) -> &'static str {
    let m = build_cli().try_get_matches_from(argv).unwrap();
    let (_, sub) = m.subcommand().unwrap();
    log_level(sub)
}

#[test]
fn verbosity_is_global() {
    assert_eq!(level(&["plcall", "check", "a.csv", "-vv"]), "trace");
    assert_eq!(level(&["plcall", "-v", "check", "a.csv"]), "debug");
    assert_eq!(level(&["plcall", "check", "a.csv"]), "info");
}

#[test]
fn help_lists_subcommands() {
    let help = build_cli().render_help().to_string();
    assert!(help.contains("gen"));
    assert!(help.contains("proto"));
    assert!(help.contains("check"));
}
