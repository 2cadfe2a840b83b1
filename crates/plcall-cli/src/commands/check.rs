use plcall_compiler::{Error, GenConfig, Result, SchemaConfig, emit_proto, generate_all};
use tracing::info;

use super::pipeline::{self, Inputs};

pub struct CheckArgs {
    pub inputs: Inputs,
    pub strict: bool,
}

/// Counts from a dry run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub packages: usize,
    pub functions: usize,
    pub skipped: usize,
}

/// Run every stage without writing. Silent on stdout when valid.
pub fn run(args: CheckArgs) -> Result<Summary> {
    let loaded = pipeline::load(&args.inputs)?;
    let config = GenConfig::new();
    let schema = SchemaConfig::new();

    let mut summary = Summary::default();
    for (package, functions) in loaded.by_package() {
        let stubs = generate_all(&functions, &config)?;
        emit_proto(&package, &functions, &schema)?;
        summary.packages += 1;
        summary.functions += functions.len();
        summary.skipped += functions.len() - stubs.len();
    }

    info!(
        packages = summary.packages,
        functions = summary.functions,
        skipped = summary.skipped,
        "check finished"
    );
    if args.strict && summary.skipped > 0 {
        return Err(Error::not_supported(
            format!("{} function(s)", summary.skipped),
            "skipped under --strict",
        ));
    }
    Ok(summary)
}
