use plcall_core::{ArgType, Argument, Function};

/// `(level, position)` of every node in catalog row order: the return value
/// first, then each argument depth-first.
pub fn flatten(function: &Function) -> Vec<(u8, u32)> {
    let mut out = Vec::new();
    for arg in function.returns.iter().chain(&function.args) {
        walk(arg, 0, &mut out);
    }
    out
}

fn walk(arg: &Argument, level: u8, out: &mut Vec<(u8, u32)>) {
    out.push((level, arg.position));
    match &arg.ty {
        ArgType::Record { fields, .. } => {
            for field in fields {
                walk(field, level + 1, out);
            }
        }
        ArgType::Table {
            elem: Some(elem), ..
        } => walk(elem, level + 1, out),
        _ => {}
    }
}
