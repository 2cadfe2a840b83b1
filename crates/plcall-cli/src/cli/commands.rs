//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Row, directive and filter inputs every command reads.
fn with_input_args(cmd: Command) -> Command {
    cmd.arg(rows_path_arg())
        .arg(directives_arg())
        .arg(types_arg())
        .arg(snapshot_arg())
        .arg(owner_arg())
        .arg(only_arg())
        .arg(skip_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("plcall")
        .about("Typed call stubs and proto schemas for PL/SQL packages")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .subcommand(gen_command())
        .subcommand(proto_command())
        .subcommand(check_command())
}

/// Generate PL/SQL blocks and Rust glue.
pub fn gen_command() -> Command {
    let cmd = Command::new("gen")
        .about("Generate PL/SQL call blocks and Rust glue")
        .after_help(
            r#"EXAMPLES:
  plcall gen args.csv                         # print to stdout
  plcall gen args.csv -d plcall.directives -o gen/
  plcall gen args.csv -p HR_API --max-table-size 1000
  plcall gen args.csv --write-snapshot types.json"#,
        )
        .arg(out_dir_arg())
        .arg(max_table_size_arg())
        .arg(batch_size_arg())
        .arg(lob_spill_arg())
        .arg(runtime_path_arg())
        .arg(write_snapshot_arg());

    with_input_args(cmd)
}

/// Emit proto3 schemas.
pub fn proto_command() -> Command {
    let cmd = Command::new("proto")
        .about("Emit proto3 messages and services")
        .after_help(
            r#"EXAMPLES:
  plcall proto args.csv -o proto/
  plcall proto args.csv --unary --proto-package acme.hr"#,
        )
        .arg(out_dir_arg())
        .arg(proto_package_arg())
        .arg(unary_arg())
        .arg(no_catalog_types_arg());

    with_input_args(cmd)
}

/// Run the whole pipeline without writing anything.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Validate rows and directives")
        .after_help(
            r#"EXAMPLES:
  plcall check args.csv -d plcall.directives
  plcall check args.csv --strict"#,
        )
        .arg(strict_arg());

    with_input_args(cmd)
}
