//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so the input flags stay identical
//! across `gen`, `proto` and `check`.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Argument rows export (positional, `-` for stdin).
pub fn rows_path_arg() -> Arg {
    Arg::new("rows_path")
        .value_name("ROWS")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Argument rows CSV (use \"-\" for stdin)")
}

/// Directive file (-d/--directives).
pub fn directives_arg() -> Arg {
    Arg::new("directives")
        .short('d')
        .long("directives")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Directive file (rename, private, replace, handle, ...)")
}

/// Type definition rows (-t/--types).
pub fn types_arg() -> Arg {
    Arg::new("types")
        .short('t')
        .long("types")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Type definition rows CSV (records, collections, tables)")
}

/// Preloaded type graph (--snapshot).
pub fn snapshot_arg() -> Arg {
    Arg::new("snapshot")
        .long("snapshot")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Type graph snapshot to resolve named types from (.json or binary)")
}

/// Owner assumed for unqualified type names (--owner).
pub fn owner_arg() -> Arg {
    Arg::new("owner")
        .long("owner")
        .value_name("SCHEMA")
        .default_value("PUBLIC")
        .help("Owner assumed for unqualified type names")
}

/// Restrict to packages or functions (-p/--only).
pub fn only_arg() -> Arg {
    Arg::new("only")
        .short('p')
        .long("only")
        .value_name("NAME")
        .action(ArgAction::Append)
        .help("Only build PACKAGE, NAME or PACKAGE.NAME (repeatable)")
}

/// Exclude packages or functions (--skip).
pub fn skip_arg() -> Arg {
    Arg::new("skip")
        .long("skip")
        .value_name("NAME")
        .action(ArgAction::Append)
        .help("Skip PACKAGE, NAME or PACKAGE.NAME (repeatable)")
}

/// Output directory (-o/--out-dir).
pub fn out_dir_arg() -> Arg {
    Arg::new("out_dir")
        .short('o')
        .long("out-dir")
        .value_name("DIR")
        .value_parser(value_parser!(PathBuf))
        .help("Write one file per package into DIR (stdout if omitted)")
}

/// Default bind array capacity (--max-table-size).
pub fn max_table_size_arg() -> Arg {
    Arg::new("max_table_size")
        .long("max-table-size")
        .value_name("N")
        .value_parser(value_parser!(usize))
        .help("Bind array capacity for functions without a max-table-size directive")
}

/// Cursor fetch size (--batch-size).
pub fn batch_size_arg() -> Arg {
    Arg::new("batch_size")
        .long("batch-size")
        .value_name("N")
        .value_parser(value_parser!(usize))
        .help("Rows fetched per REF CURSOR batch")
}

/// LOB spill threshold (--lob-spill).
pub fn lob_spill_arg() -> Arg {
    Arg::new("lob_spill")
        .long("lob-spill")
        .value_name("BYTES")
        .value_parser(value_parser!(usize))
        .help("Spill LOBs larger than BYTES to a temp file")
}

/// Crate path of the runtime in generated glue (--runtime-path).
pub fn runtime_path_arg() -> Arg {
    Arg::new("runtime_path")
        .long("runtime-path")
        .value_name("PATH")
        .help("Crate path the generated glue imports the runtime from")
}

/// Save the resolved type graph (--write-snapshot).
pub fn write_snapshot_arg() -> Arg {
    Arg::new("write_snapshot")
        .long("write-snapshot")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write the resolved type graph (.json, else binary)")
}

/// Proto package name (--proto-package).
pub fn proto_package_arg() -> Arg {
    Arg::new("proto_package")
        .long("proto-package")
        .value_name("NAME")
        .help("proto `package` line (defaults to the lowercased PL/SQL package)")
}

/// Unary RPCs for cursor functions (--unary).
pub fn unary_arg() -> Arg {
    Arg::new("unary")
        .long("unary")
        .action(ArgAction::SetTrue)
        .help("Return cursor rows in one message instead of streaming")
}

/// Omit catalog type options (--no-catalog-types).
pub fn no_catalog_types_arg() -> Arg {
    Arg::new("no_catalog_types")
        .long("no-catalog-types")
        .action(ArgAction::SetTrue)
        .help("Do not annotate fields with their catalog type")
}

/// Skipped functions fail the check (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Fail if any function has to be skipped")
}

/// Verbosity (-v), global.
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .global(true)
        .help("Verbosity level (-v for debug, -vv for trace)")
}
