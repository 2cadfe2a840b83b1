use std::path::PathBuf;

use plcall_compiler::{Result, SchemaConfig, emit_proto};
use tracing::info;

use super::pipeline::{self, Inputs};

pub struct ProtoArgs {
    pub inputs: Inputs,
    pub out_dir: Option<PathBuf>,
    pub config: SchemaConfig,
}

pub fn run(args: ProtoArgs) -> Result<()> {
    let loaded = pipeline::load(&args.inputs)?;

    for (package, functions) in loaded.by_package() {
        let proto = emit_proto(&package, &functions, &args.config)?;
        let stem = pipeline::file_stem(&package);
        pipeline::emit(args.out_dir.as_deref(), &format!("{stem}.proto"), &proto)?;
        info!(package = %package, functions = functions.len(), "emitted proto");
    }
    Ok(())
}
