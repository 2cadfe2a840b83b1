//! Call stub generation.
//!
//! Each function is lowered into an anonymous PL/SQL block whose positional
//! binds carry the caller's values in and out, plus a Rust glue function
//! that builds those binds from a request tree and collects the outputs.
//! Composite arguments never cross the bind boundary: records are bridged
//! through typed locals one field at a time, and tables through index-by
//! arrays of scalars, one array per leaf column.

mod config;
mod glue;
mod lower;
mod naming;


use plcall_core::{CallPlan, Function};
use tracing::{debug, warn};

pub use config::GenConfig;
pub use glue::{render_function, render_module, render_sql};
pub use naming::Naming;

use crate::Result;

/// Generated artifacts for one function.
#[derive(Clone, Debug)]
pub struct Stub {
    pub function: Function,
    pub plan: CallPlan,
    /// Rust source of the glue function.
    pub glue: String,
}

/// Compile one function.
pub fn generate(function: &Function, config: &GenConfig, naming: &mut Naming) -> Result<Stub> {
    let (block, slots) = lower::lower(function, config, naming)?;
    let plan = CallPlan {
        function: function.qualified_name(),
        ident: function.ident(),
        block,
        slots,
        cursor_batch_size: config.cursor_batch_size,
        lob_spill_threshold: config.lob_spill_threshold,
    };
    let glue = render_function(&plan, config);
    debug!(function = %function, slots = plan.slots.len(), "generated stub");
    Ok(Stub {
        function: function.clone(),
        plan,
        glue,
    })
}

/// Compile every function, skipping the ones that cannot be represented.
pub fn generate_all(functions: &[Function], config: &GenConfig) -> Result<Vec<Stub>> {
    let mut naming = Naming::new();
    let mut stubs = Vec::with_capacity(functions.len());
    for function in functions {
        match generate(function, config, &mut naming) {
            Ok(stub) => stubs.push(stub),
            Err(err) if err.is_skippable() => {
                warn!(function = %function, error = %err, "skipping function");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(stubs)
}
