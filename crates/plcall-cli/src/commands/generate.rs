use std::path::PathBuf;

use plcall_compiler::{GenConfig, Result, generate_all, render_module, render_sql};
use tracing::info;

use super::pipeline::{self, Inputs};

pub struct GenArgs {
    pub inputs: Inputs,
    pub out_dir: Option<PathBuf>,
    pub config: GenConfig,
    pub write_snapshot: Option<PathBuf>,
}

pub fn run(args: GenArgs) -> Result<()> {
    let loaded = pipeline::load(&args.inputs)?;

    for (package, functions) in loaded.by_package() {
        let stubs = generate_all(&functions, &args.config)?;
        let stem = pipeline::file_stem(&package);
        pipeline::emit(
            args.out_dir.as_deref(),
            &format!("{stem}.sql"),
            &render_sql(&package, &stubs),
        )?;
        pipeline::emit(
            args.out_dir.as_deref(),
            &format!("{stem}.rs"),
            &render_module(&package, &stubs, &args.config),
        )?;
        info!(
            package = %package,
            stubs = stubs.len(),
            skipped = functions.len() - stubs.len(),
            "generated package"
        );
    }

    if let Some(path) = &args.write_snapshot {
        pipeline::write_snapshot(path, &loaded.graph.snapshot())?;
    }
    Ok(())
}
