//! Lowering of a function into a PL/SQL block and its bind slots.
//!
//! The block is written in three sections: copy-in statements for
//! composite inputs, the call itself, and copy-out statements for composite
//! outputs. Slots are appended in exactly that order, so each slot's
//! position is final the moment it is created; nothing is renumbered.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use plcall_core::utils::{is_plain_sql_ident, unique_field_names};
use plcall_core::{
    ArgType, Argument, BindSlot, Column, Direction, Function, PathSeg, Replacement, Scalar,
    SlotKind, SlotSource, ValuePath,
};

use super::{GenConfig, Naming};
use crate::{Error, Result};

/// A scalar leaf under a collection element.
struct Leaf {
    /// Accessor appended to the element, e.g. `.ADDR.CITY`; empty for
    /// scalar elements.
    suffix: String,
    /// Location inside one element.
    path: ValuePath,
    scalar: Scalar,
}

pub(super) struct Lowering<'a> {
    function: &'a Function,
    naming: &'a mut Naming,
    capacity: usize,
    decls: Vec<String>,
    pre: Vec<String>,
    call: Vec<String>,
    post: Vec<String>,
    slots: Vec<BindSlot>,
    first: HashMap<ValuePath, usize>,
    declared: HashSet<String>,
    array_types: IndexMap<String, String>,
    loops: usize,
}

/// Compile `function` into block text and slots.
pub(super) fn lower(
    function: &Function,
    config: &GenConfig,
    naming: &mut Naming,
) -> Result<(String, Vec<BindSlot>)> {
    let capacity = function.max_table_size.unwrap_or(config.max_table_size);
    let mut lowering = Lowering {
        function,
        naming,
        capacity,
        decls: Vec::new(),
        pre: Vec::new(),
        call: Vec::new(),
        post: Vec::new(),
        slots: Vec::new(),
        first: HashMap::new(),
        declared: HashSet::new(),
        array_types: IndexMap::new(),
        loops: 0,
    };
    match &function.replacement {
        Some(replacement) => lowering.lower_replacement(replacement)?,
        None => lowering.lower_direct()?,
    }
    Ok(lowering.finish())
}

/// Record fields with the names they take in value trees.
fn named_fields(fields: &[Argument]) -> impl Iterator<Item = (&Argument, String)> {
    let names = unique_field_names(fields.iter().map(|f| f.name.as_str()));
    fields.iter().zip(names)
}

fn join(base: &ValuePath, rest: &ValuePath) -> ValuePath {
    ValuePath(base.segments().iter().chain(rest.segments()).cloned().collect())
}

fn plsql_name(name: &str) -> String {
    if is_plain_sql_ident(name) {
        name.to_string()
    } else {
        format!("\"{name}\"")
    }
}

fn path_ident(path: &ValuePath) -> String {
    path.segments()
        .iter()
        .filter_map(|seg| match seg {
            PathSeg::Field(name) => Some(name.as_str()),
            PathSeg::Each => None,
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Leaves of a collection element; collections inside elements are rejected.
fn leaves(function: &Function, elem: &Argument) -> Result<Vec<Leaf>> {
    fn walk(
        function: &Function,
        arg: &Argument,
        suffix: String,
        path: ValuePath,
        out: &mut Vec<Leaf>,
    ) -> Result<()> {
        match &arg.ty {
            ArgType::Simple(scalar) => out.push(Leaf {
                suffix,
                path,
                scalar: scalar.clone(),
            }),
            ArgType::Record { fields, .. } if fields.is_empty() => {
                return Err(empty_record(function, arg));
            }
            ArgType::Record { fields, .. } => {
                for (field, name) in named_fields(fields) {
                    walk(
                        function,
                        field,
                        format!("{suffix}.{}", plsql_name(&field.name)),
                        path.field(&name),
                        out,
                    )?;
                }
            }
            ArgType::Table { .. } => {
                return Err(Error::not_supported(
                    function.to_string(),
                    "collection nested inside a collection element",
                ));
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(function, elem, String::new(), ValuePath::root(), &mut out)?;
    Ok(out)
}

fn empty_record(function: &Function, arg: &Argument) -> Error {
    Error::not_supported(
        function.to_string(),
        format!("record {:?} has no fields", arg.name),
    )
}

fn missing_element(function: &Function, arg: &Argument) -> Error {
    Error::MissingElementType {
        function: function.to_string(),
        argument: arg.name.clone(),
    }
}

impl Lowering<'_> {
    fn finish(self) -> (String, Vec<BindSlot>) {
        let mut block = String::new();
        if !self.decls.is_empty() {
            block.push_str("DECLARE\n");
            for decl in &self.decls {
                block.push_str("  ");
                block.push_str(decl);
                block.push('\n');
            }
        }
        block.push_str("BEGIN\n");
        for line in self.pre.iter().chain(&self.call).chain(&self.post) {
            block.push_str("  ");
            block.push_str(line);
            block.push('\n');
        }
        block.push_str("END;\n");
        (block, self.slots)
    }

    fn bind(&mut self, path: ValuePath, direction: Direction, kind: SlotKind) -> usize {
        let index = self.slots.len();
        let source = match self.first.get(&path) {
            Some(&first) => SlotSource::CopyOf(first),
            None => {
                self.first.insert(path.clone(), index);
                SlotSource::Convert
            }
        };
        self.slots.push(BindSlot {
            position: index + 1,
            path,
            direction,
            kind,
            source,
        });
        index + 1
    }

    fn ident(&mut self, long: &str) -> String {
        self.naming.ident(&self.function.package, long)
    }

    fn declare(&mut self, name: &str, decl: String) {
        if self.declared.insert(name.to_string()) {
            self.decls.push(decl);
        }
    }

    /// Bridging local for a composite argument, typed like the argument.
    fn local(&mut self, arg: &Argument, long: &str) -> Result<String> {
        let type_name = arg.ty.type_name().ok_or_else(|| {
            Error::not_supported(
                self.function.to_string(),
                format!("argument {:?} has no declared type", arg.name),
            )
        })?;
        let name = self.ident(long);
        let decl = format!("{name} {type_name};");
        self.declare(&name, decl);
        Ok(name)
    }

    fn loop_var(&mut self) -> String {
        self.loops += 1;
        let name = format!("i{}", self.loops);
        self.declare(&name, format!("{name} PLS_INTEGER;"));
        name
    }

    /// Index-by table local that carries one leaf column across the bind.
    fn array_local(&mut self, each: &ValuePath, leaf: &Leaf) -> String {
        let elem_decl = leaf.scalar.plsql_elem_decl();
        let next = self.array_types.len() + 1;
        let type_name = self
            .array_types
            .entry(elem_decl.clone())
            .or_insert_with(|| format!("t_{next}"))
            .clone();
        self.declare(
            &type_name,
            format!("TYPE {type_name} IS TABLE OF {elem_decl} INDEX BY BINARY_INTEGER;"),
        );

        let path = join(each, &leaf.path);
        let name = self.ident(&format!("x_{}", path_ident(&path)));
        self.declare(&name, format!("{name} {type_name};"));
        name
    }

    fn lower_direct(&mut self) -> Result<()> {
        let function = self.function;
        let (names, ret_name) = function.field_names();
        let paths: Vec<ValuePath> = names.iter().map(|n| ValuePath::root().field(n)).collect();

        let mut locals = Vec::with_capacity(function.args.len());
        for ((arg, name), path) in function.args.iter().zip(&names).zip(&paths) {
            let local = match &arg.ty {
                ArgType::Simple(_) | ArgType::Table { cursor: true, .. } => None,
                _ => {
                    let local = self.local(arg, &format!("v_{name}"))?;
                    if arg.direction.is_input() {
                        self.lower_in(arg, &local, path)?;
                    }
                    Some(local)
                }
            };
            locals.push(local);
        }

        let mut ret_local = None;
        let target = match (&function.returns, &ret_name) {
            (Some(ret), Some(ret_name)) => Some(match &ret.ty {
                ArgType::Simple(_) | ArgType::Table { cursor: true, .. } => {
                    let path = ValuePath::root().field(ret_name);
                    format!(":{}", self.bind_direct(ret, path, Direction::Out)?)
                }
                _ => {
                    let local = self.local(ret, &format!("v_{ret_name}"))?;
                    ret_local = Some(local.clone());
                    local
                }
            }),
            _ => None,
        };

        let mut params = Vec::with_capacity(function.args.len());
        for ((arg, local), path) in function.args.iter().zip(&locals).zip(&paths) {
            let value = match local {
                Some(local) => local.clone(),
                None => format!(":{}", self.bind_direct(arg, path.clone(), arg.direction)?),
            };
            params.push(format!("{} => {value}", plsql_name(&arg.name)));
        }

        let mut call = function.qualified_name();
        if !params.is_empty() {
            call = format!("{call}({})", params.join(", "));
        }
        let statement = match target {
            Some(target) => format!("{target} := {call};"),
            None => format!("{call};"),
        };
        self.push_call(statement);

        for ((arg, local), path) in function.args.iter().zip(&locals).zip(&paths) {
            if let Some(local) = local
                && arg.direction.is_output()
            {
                self.lower_out(arg, local, path)?;
            }
        }
        if let (Some(ret), Some(local), Some(ret_name)) = (&function.returns, &ret_local, &ret_name) {
            self.lower_out(ret, local, &ValuePath::root().field(ret_name))?;
        }
        Ok(())
    }

    /// The call statement, wrapped in a handler block when exceptions are
    /// swallowed.
    fn push_call(&mut self, statement: String) {
        if self.function.handles.is_empty() {
            self.call.push(statement);
            return;
        }
        self.call.push("BEGIN".to_string());
        self.call.push(format!("  {statement}"));
        self.call.push("EXCEPTION".to_string());
        for exception in &self.function.handles {
            self.call.push(format!("  WHEN {exception} THEN NULL;"));
        }
        self.call.push("END;".to_string());
    }

    /// Scalar or cursor bound straight into the call.
    fn bind_direct(
        &mut self,
        arg: &Argument,
        path: ValuePath,
        direction: Direction,
    ) -> Result<usize> {
        match &arg.ty {
            ArgType::Simple(scalar) => Ok(self.bind(path, direction, SlotKind::Scalar(scalar.kind()))),
            ArgType::Table {
                cursor: true,
                elem,
                ..
            } => {
                if direction != Direction::Out {
                    return Err(Error::not_supported(
                        self.function.to_string(),
                        format!("REF CURSOR {:?} must be an output", arg.name),
                    ));
                }
                let elem = elem
                    .as_deref()
                    .ok_or_else(|| missing_element(self.function, arg))?;
                let columns = leaves(self.function, elem)?
                    .into_iter()
                    .map(|leaf| Column {
                        path: leaf.path,
                        kind: leaf.scalar.kind(),
                    })
                    .collect();
                Ok(self.bind(path, Direction::Out, SlotKind::Cursor { columns }))
            }
            _ => unreachable!("composite arguments are bridged through locals"),
        }
    }

    fn lower_in(&mut self, arg: &Argument, target: &str, path: &ValuePath) -> Result<()> {
        match &arg.ty {
            ArgType::Simple(scalar) => {
                let pos = self.bind(path.clone(), Direction::In, SlotKind::Scalar(scalar.kind()));
                self.pre.push(format!("{target} := :{pos};"));
            }
            ArgType::Record { fields, .. } if fields.is_empty() => {
                return Err(empty_record(self.function, arg));
            }
            ArgType::Record { fields, .. } => {
                for (field, name) in named_fields(fields) {
                    let target = format!("{target}.{}", plsql_name(&field.name));
                    self.lower_in(field, &target, &path.field(&name))?;
                }
            }
            ArgType::Table { cursor: true, .. } => {
                return Err(Error::not_supported(
                    self.function.to_string(),
                    format!("REF CURSOR {:?} cannot be an input", arg.name),
                ));
            }
            ArgType::Table {
                elem: None, ..
            } => return Err(missing_element(self.function, arg)),
            ArgType::Table {
                elem: Some(elem),
                nested,
                type_name,
                ..
            } => {
                let leaves = leaves(self.function, elem)?;
                let each = path.each();
                let mut arrays = Vec::with_capacity(leaves.len());
                for leaf in &leaves {
                    let array = self.array_local(&each, leaf);
                    let kind = SlotKind::Array {
                        elem: leaf.scalar.kind(),
                        capacity: self.capacity,
                    };
                    let pos = self.bind(join(&each, &leaf.path), Direction::In, kind);
                    self.pre.push(format!("{array} := :{pos};"));
                    arrays.push(array);
                }

                let i = self.loop_var();
                let driver = &arrays[0];
                let slot = if *nested {
                    let type_name = type_name.as_deref().ok_or_else(|| {
                        Error::not_supported(
                            self.function.to_string(),
                            format!("nested table {:?} has no declared type", arg.name),
                        )
                    })?;
                    self.pre.push(format!("{target} := {type_name}();"));
                    format!("{target}({target}.LAST)")
                } else {
                    format!("{target}({i})")
                };
                self.pre.push(format!("{i} := {driver}.FIRST;"));
                self.pre.push(format!("WHILE {i} IS NOT NULL LOOP"));
                if *nested {
                    self.pre.push(format!("  {target}.EXTEND;"));
                }
                for (leaf, array) in leaves.iter().zip(&arrays) {
                    self.pre
                        .push(format!("  {slot}{} := {array}({i});", leaf.suffix));
                }
                self.pre.push(format!("  {i} := {driver}.NEXT({i});"));
                self.pre.push("END LOOP;".to_string());
            }
        }
        Ok(())
    }

    fn lower_out(&mut self, arg: &Argument, source: &str, path: &ValuePath) -> Result<()> {
        match &arg.ty {
            ArgType::Simple(scalar) => {
                let pos = self.bind(path.clone(), Direction::Out, SlotKind::Scalar(scalar.kind()));
                self.post.push(format!(":{pos} := {source};"));
            }
            ArgType::Record { fields, .. } if fields.is_empty() => {
                return Err(empty_record(self.function, arg));
            }
            ArgType::Record { fields, .. } => {
                for (field, name) in named_fields(fields) {
                    let source = format!("{source}.{}", plsql_name(&field.name));
                    self.lower_out(field, &source, &path.field(&name))?;
                }
            }
            ArgType::Table { cursor: true, .. } => {
                return Err(Error::not_supported(
                    self.function.to_string(),
                    format!("REF CURSOR {:?} inside a composite", arg.name),
                ));
            }
            ArgType::Table {
                elem: None, ..
            } => return Err(missing_element(self.function, arg)),
            ArgType::Table {
                elem: Some(elem),
                nested,
                ..
            } => {
                let leaves = leaves(self.function, elem)?;
                let each = path.each();
                let arrays: Vec<String> = leaves
                    .iter()
                    .map(|leaf| self.array_local(&each, leaf))
                    .collect();
                let i = self.loop_var();
                let capacity = self.capacity;

                let mut copy = vec![
                    format!("{i} := {source}.FIRST;"),
                    format!("WHILE {i} IS NOT NULL LOOP"),
                    format!("  EXIT WHEN {}.COUNT >= {capacity};", arrays[0]),
                ];
                for (leaf, array) in leaves.iter().zip(&arrays) {
                    copy.push(format!(
                        "  {array}({array}.COUNT + 1) := {source}({i}){};",
                        leaf.suffix
                    ));
                }
                copy.push(format!("  {i} := {source}.NEXT({i});"));
                copy.push("END LOOP;".to_string());

                for array in &arrays {
                    self.post.push(format!("{array}.DELETE;"));
                }
                // An atomically null nested table has no FIRST.
                if *nested {
                    self.post.push(format!("IF {source} IS NOT NULL THEN"));
                    self.post.extend(copy.into_iter().map(|line| format!("  {line}")));
                    self.post.push("END IF;".to_string());
                } else {
                    self.post.extend(copy);
                }

                for (leaf, array) in leaves.iter().zip(&arrays) {
                    let kind = SlotKind::Array {
                        elem: leaf.scalar.kind(),
                        capacity,
                    };
                    let pos = self.bind(join(&each, &leaf.path), Direction::Out, kind);
                    self.post.push(format!(":{pos} := {array};"));
                }
            }
        }
        Ok(())
    }

    /// Whole request in, whole response out, through the replacement's
    /// single input and single output.
    fn lower_replacement(&mut self, replacement: &Replacement) -> Result<()> {
        let target = &replacement.function;
        let unsupported = || {
            Error::not_supported(
                self.function.to_string(),
                format!(
                    "replacement {} must take one scalar input and produce one scalar output",
                    target.qualified_name()
                ),
            )
        };

        let all_simple = target
            .args
            .iter()
            .chain(&target.returns)
            .all(|a| matches!(a.ty, ArgType::Simple(_)));
        let inputs = target.args.iter().filter(|a| a.direction.is_input()).count();
        let outputs = target.args.iter().filter(|a| a.direction.is_output()).count()
            + usize::from(target.returns.is_some());
        if !all_simple || inputs != 1 || outputs != 1 {
            return Err(unsupported());
        }

        let kind = SlotKind::Blob(replacement.format);
        let push = |slots: &mut Vec<BindSlot>, direction: Direction| {
            let position = slots.len() + 1;
            slots.push(BindSlot {
                position,
                path: ValuePath::root(),
                direction,
                kind: kind.clone(),
                source: SlotSource::Convert,
            });
            position
        };

        let returned = target
            .returns
            .as_ref()
            .map(|_| push(&mut self.slots, Direction::Out));
        let params: Vec<String> = target
            .args
            .iter()
            .map(|arg| {
                let pos = push(&mut self.slots, arg.direction);
                format!("{} => :{pos}", plsql_name(&arg.name))
            })
            .collect();

        let call = format!("{}({})", target.qualified_name(), params.join(", "));
        let statement = match returned {
            Some(pos) => format!(":{pos} := {call};"),
            None => format!("{call};"),
        };
        self.push_call(statement);
        Ok(())
    }
}
