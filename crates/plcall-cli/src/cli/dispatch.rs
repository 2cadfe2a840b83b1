//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;
use plcall_compiler::{GenConfig, SchemaConfig};

use crate::commands::check::CheckArgs;
use crate::commands::generate::GenArgs;
use crate::commands::pipeline::Inputs;
use crate::commands::proto::ProtoArgs;

/// Inputs shared by every subcommand.
#[derive(Debug)]
pub struct InputParams {
    pub rows_path: PathBuf,
    pub directives: Option<PathBuf>,
    pub types: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub owner: String,
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

impl InputParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            rows_path: m
                .get_one::<PathBuf>("rows_path")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("-")),
            directives: m.get_one::<PathBuf>("directives").cloned(),
            types: m.get_one::<PathBuf>("types").cloned(),
            snapshot: m.get_one::<PathBuf>("snapshot").cloned(),
            owner: m
                .get_one::<String>("owner")
                .cloned()
                .unwrap_or_else(|| "PUBLIC".to_string()),
            only: strings(m, "only"),
            skip: strings(m, "skip"),
        }
    }
}

impl From<InputParams> for Inputs {
    fn from(p: InputParams) -> Self {
        Self {
            rows_path: p.rows_path,
            directives: p.directives,
            types: p.types,
            snapshot: p.snapshot,
            owner: p.owner,
            only: p.only,
            skip: p.skip,
        }
    }
}

pub struct GenParams {
    pub inputs: InputParams,
    pub out_dir: Option<PathBuf>,
    pub max_table_size: Option<usize>,
    pub batch_size: Option<usize>,
    pub lob_spill: Option<usize>,
    pub runtime_path: Option<String>,
    pub write_snapshot: Option<PathBuf>,
}

impl GenParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            inputs: InputParams::from_matches(m),
            out_dir: m.get_one::<PathBuf>("out_dir").cloned(),
            max_table_size: m.get_one::<usize>("max_table_size").copied(),
            batch_size: m.get_one::<usize>("batch_size").copied(),
            lob_spill: m.get_one::<usize>("lob_spill").copied(),
            runtime_path: m.get_one::<String>("runtime_path").cloned(),
            write_snapshot: m.get_one::<PathBuf>("write_snapshot").cloned(),
        }
    }
}

impl From<GenParams> for GenArgs {
    fn from(p: GenParams) -> Self {
        let mut config = GenConfig::new();
        if let Some(n) = p.max_table_size {
            config = config.max_table_size(n);
        }
        if let Some(n) = p.batch_size {
            config = config.cursor_batch_size(n);
        }
        if let Some(n) = p.lob_spill {
            config = config.lob_spill_threshold(n);
        }
        if let Some(path) = p.runtime_path {
            config = config.runtime_path(path);
        }
        Self {
            inputs: p.inputs.into(),
            out_dir: p.out_dir,
            config,
            write_snapshot: p.write_snapshot,
        }
    }
}

pub struct ProtoParams {
    pub inputs: InputParams,
    pub out_dir: Option<PathBuf>,
    pub proto_package: Option<String>,
    pub unary: bool,
    pub no_catalog_types: bool,
}

impl ProtoParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            inputs: InputParams::from_matches(m),
            out_dir: m.get_one::<PathBuf>("out_dir").cloned(),
            proto_package: m.get_one::<String>("proto_package").cloned(),
            unary: m.get_flag("unary"),
            no_catalog_types: m.get_flag("no_catalog_types"),
        }
    }
}

impl From<ProtoParams> for ProtoArgs {
    fn from(p: ProtoParams) -> Self {
        let mut config = SchemaConfig::new()
            .stream_cursors(!p.unary)
            .catalog_types(!p.no_catalog_types);
        if let Some(name) = p.proto_package {
            config = config.proto_package(name);
        }
        Self {
            inputs: p.inputs.into(),
            out_dir: p.out_dir,
            config,
        }
    }
}

pub struct CheckParams {
    pub inputs: InputParams,
    pub strict: bool,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            inputs: InputParams::from_matches(m),
            strict: m.get_flag("strict"),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            inputs: p.inputs.into(),
            strict: p.strict,
        }
    }
}

/// Log level directive for a `-v` count.
pub fn log_level(m: &ArgMatches) -> &'static str {
    match m.get_count("verbose") {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn strings(m: &ArgMatches, id: &str) -> Vec<String> {
    m.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
