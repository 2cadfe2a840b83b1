use indexmap::IndexMap;
use plcall_core::{ArgType, Argument, Direction, Flavor, Function};
use tracing::debug;

use super::{FunctionFilter, TypeLookup};
use crate::catalog::ArgRow;
use crate::{Error, Result};

struct Node {
    arg: Argument,
    children: Vec<usize>,
}

/// Group rows per subprogram and rebuild one [`Function`] per group.
///
/// Hidden and filtered-out subprograms are dropped before building. When a
/// `lookup` is given, tables without an element row and unexpanded object
/// arguments are filled in from it; lookups that fail with a skippable error
/// leave the argument as is.
pub fn build_functions<I>(
    rows: I,
    filter: &FunctionFilter,
    lookup: Option<&dyn TypeLookup>,
) -> Result<Vec<Function>>
where
    I: IntoIterator<Item = ArgRow>,
{
    let mut groups: IndexMap<(String, String, Option<u32>), Vec<ArgRow>> = IndexMap::new();
    let mut dropped = 0;
    for row in rows {
        if row.is_hidden() || !filter.accepts(&row.package_name, &row.object_name) {
            dropped += 1;
            continue;
        }
        groups.entry(row.subprogram_key()).or_default().push(row);
    }

    let mut functions = Vec::with_capacity(groups.len());
    for ((package, name, overload), mut rows) in groups {
        if rows.iter().all(|r| r.sequence.is_some()) {
            rows.sort_by_key(|r| r.sequence);
        }
        let mut function = build_one(package, name, overload, &rows)?;
        if let Some(lookup) = lookup {
            expand_function(&mut function, lookup)?;
        }
        functions.push(function);
    }

    debug!(
        functions = functions.len(),
        dropped_rows = dropped,
        "built argument trees"
    );
    Ok(functions)
}

fn build_one(
    package: String,
    name: String,
    overload: Option<u32>,
    rows: &[ArgRow],
) -> Result<Function> {
    let label = format!("{package}.{name}");
    let root = Argument::new(
        "",
        Direction::In,
        ArgType::Record {
            type_name: None,
            fields: Vec::new(),
        },
    );
    let mut nodes = vec![Node {
        arg: root,
        children: Vec::new(),
    }];
    // open[level] is the composite that receives rows at `level`;
    // open[0] is the virtual root record.
    let mut open = vec![0];
    let mut returns = None;

    for row in rows {
        if row.data_type.trim().is_empty() {
            continue;
        }
        let level = usize::from(row.data_level);
        if level >= open.len() {
            return Err(Error::InternalConsistency(format!(
                "{label}: argument {:?} at level {level} has no open parent",
                row.argument_name
            )));
        }
        open.truncate(level + 1);

        let arg = row_argument(row)?;
        let composite = arg.flavor() != Flavor::Simple;
        let idx = nodes.len();
        nodes.push(Node {
            arg,
            children: Vec::new(),
        });

        if level == 0 && row.argument_name.is_empty() {
            if returns.replace(idx).is_some() {
                return Err(Error::InternalConsistency(format!(
                    "{label}: more than one return value"
                )));
            }
        } else {
            attach(&mut nodes, open[level], idx, &label)?;
        }

        if composite {
            open.push(idx);
        }
    }

    let args = nodes[0]
        .children
        .iter()
        .map(|&child| assemble(&nodes, child))
        .collect();
    Ok(Function {
        package,
        name,
        overload,
        args,
        returns: returns.map(|idx| assemble(&nodes, idx)),
        ..Function::default()
    })
}

fn attach(nodes: &mut [Node], parent: usize, child: usize, label: &str) -> Result<()> {
    let parent = &mut nodes[parent];
    match parent.arg.ty {
        ArgType::Record { .. } => {}
        ArgType::Table { .. } if parent.children.is_empty() => {}
        ArgType::Table { .. } => {
            return Err(Error::InternalConsistency(format!(
                "{label}: table {:?} has more than one element",
                parent.arg.name
            )));
        }
        ArgType::Simple(_) => {
            return Err(Error::InternalConsistency(format!(
                "{label}: scalar {:?} cannot have children",
                parent.arg.name
            )));
        }
    }
    parent.children.push(child);
    Ok(())
}

fn assemble(nodes: &[Node], idx: usize) -> Argument {
    let node = &nodes[idx];
    let mut arg = node.arg.clone();
    match &mut arg.ty {
        ArgType::Record { fields, .. } => {
            *fields = node.children.iter().map(|&c| assemble(nodes, c)).collect();
        }
        ArgType::Table { elem, .. } => {
            *elem = node
                .children
                .first()
                .map(|&c| Box::new(assemble(nodes, c)));
        }
        ArgType::Simple(_) => {}
    }
    arg
}

fn row_argument(row: &ArgRow) -> Result<Argument> {
    let direction = row.direction()?;
    let data_type = row.data_type.trim().to_ascii_uppercase();
    let ty = match Flavor::from_data_type(&data_type) {
        Flavor::Simple => ArgType::Simple(row.scalar()),
        Flavor::Record => ArgType::Record {
            type_name: row.type_reference(),
            fields: Vec::new(),
        },
        Flavor::Table => ArgType::Table {
            type_name: row.type_reference(),
            elem: None,
            nested: matches!(data_type.as_str(), "TABLE" | "VARRAY"),
            cursor: data_type == "REF CURSOR",
        },
    };
    Ok(Argument::new(row.argument_name.clone(), direction, ty).at(row.position))
}

fn expand_function(function: &mut Function, lookup: &dyn TypeLookup) -> Result<()> {
    let label = function.to_string();
    for arg in function.args.iter_mut().chain(function.returns.iter_mut()) {
        expand_arg(arg, lookup, &label)?;
    }
    Ok(())
}

fn expand_arg(arg: &mut Argument, lookup: &dyn TypeLookup, function: &str) -> Result<()> {
    let reference = match &arg.ty {
        ArgType::Table {
            elem: None,
            cursor: false,
            type_name,
            ..
        } => type_name.clone(),
        ArgType::Record { fields, type_name } if fields.is_empty() => type_name.clone(),
        ArgType::Simple(scalar) if scalar.is_unexpanded_object() => scalar.type_name.clone(),
        _ => None,
    };

    if let Some(reference) = reference {
        match lookup.lookup(&reference, arg.direction) {
            Ok(mut ty) => {
                if let (
                    ArgType::Table { nested, .. },
                    ArgType::Table {
                        nested: declared, ..
                    },
                ) = (&mut ty, &arg.ty)
                {
                    *nested = *declared;
                }
                arg.ty = ty;
                return Ok(());
            }
            Err(err) if err.is_skippable() => {
                debug!(function, argument = %arg.name, error = %err, "argument type not expanded");
            }
            Err(err) => return Err(err),
        }
    }

    match &mut arg.ty {
        ArgType::Record { fields, .. } => {
            for field in fields {
                expand_arg(field, lookup, function)?;
            }
        }
        ArgType::Table {
            elem: Some(elem), ..
        } => expand_arg(elem, lookup, function)?,
        _ => {}
    }
    Ok(())
}
