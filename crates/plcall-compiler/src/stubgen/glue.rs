//! Rust glue rendering.

use std::fmt::Write as _;

use plcall_core::{CallPlan, Direction, SlotKind, SlotSource};

use super::{GenConfig, Stub};

const STRICT_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED_PATHS: &[&str] = &["crate", "self", "super", "Self"];

fn rust_ident(name: &str) -> String {
    if RESERVED_PATHS.contains(&name) {
        format!("{name}_")
    } else if STRICT_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Raw string literal that cannot be terminated early by the text.
fn raw_string(text: &str) -> String {
    let mut longest = 0;
    let mut run: Option<usize> = None;
    for c in text.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => {
                longest = longest.max(n + 1);
                Some(n + 1)
            }
            _ => None,
        };
    }
    let hashes = "#".repeat(longest + 1);
    format!("r{hashes}\"{text}\"{hashes}")
}

/// Glue function for one plan.
pub fn render_function(plan: &CallPlan, config: &GenConfig) -> String {
    let mut out = String::new();
    let ident = rust_ident(&plan.ident);

    writeln!(out, "/// Calls `{}`.", plan.function).unwrap();
    writeln!(
        out,
        "pub fn {ident}<E: Executor + ?Sized>(exec: &mut E, req: &Value, opts: &CallOptions) -> Result<Response> {{"
    )
    .unwrap();
    writeln!(out, "    const BLOCK: &str = {};", raw_string(&plan.block)).unwrap();
    writeln!(out, "    opts.check()?;").unwrap();
    writeln!(
        out,
        "    let mut binds = Vec::with_capacity({});",
        plan.slots.len()
    )
    .unwrap();

    for slot in &plan.slots {
        let path = slot.path.to_string();
        let capacity = match slot.kind {
            SlotKind::Array { capacity, .. } => Some(capacity),
            _ => None,
        };
        match slot.source {
            SlotSource::CopyOf(first) if slot.direction == Direction::In => {
                writeln!(out, "    let copy = marshal::copy_in(&binds[{first}]);").unwrap();
                writeln!(out, "    binds.push(copy);").unwrap();
                continue;
            }
            SlotSource::CopyOf(first) => {
                writeln!(
                    out,
                    "    let copy = marshal::copy_out(&binds[{first}], {capacity:?});"
                )
                .unwrap();
                writeln!(out, "    binds.push(copy);").unwrap();
                continue;
            }
            SlotSource::Convert => {}
        }

        let expr = match (&slot.kind, slot.direction) {
            (_, Direction::Out) => match slot.kind {
                SlotKind::Array { capacity, .. } => format!("marshal::array_out({capacity})"),
                _ => "marshal::output()".to_string(),
            },
            (SlotKind::Scalar(kind), direction) => format!(
                "marshal::{}(req, {path:?}, ScalarKind::{kind:?})?",
                if direction == Direction::In { "scalar_in" } else { "scalar_inout" }
            ),
            (SlotKind::Array { elem, capacity }, direction) => format!(
                "marshal::{}(req, {path:?}, ScalarKind::{elem:?}, {capacity})?",
                if direction == Direction::In { "array_in" } else { "array_inout" }
            ),
            (SlotKind::Blob(format), direction) => format!(
                "marshal::{}(req, BlobFormat::{format:?})?",
                if direction == Direction::In { "blob_in" } else { "blob_inout" }
            ),
            // Cursors are output only.
            (SlotKind::Cursor { .. }, _) => "marshal::output()".to_string(),
        };
        writeln!(out, "    binds.push({expr});").unwrap();
    }

    writeln!(out, "    exec.execute(BLOCK, &mut binds, opts.deadline)?;").unwrap();
    writeln!(out, "    let mut resp = Response::new();").unwrap();
    for (index, slot) in plan.output_slots() {
        let path = slot.path.to_string();
        let line = match &slot.kind {
            SlotKind::Scalar(kind) if kind.is_lob() => format!(
                "marshal::collect_lob(&mut resp, &mut binds[{index}], {path:?}, ScalarKind::{kind:?}, {})?;",
                config.lob_spill_threshold
            ),
            SlotKind::Scalar(kind) => format!(
                "marshal::collect_scalar(&mut resp, &binds[{index}], {path:?}, ScalarKind::{kind:?})?;"
            ),
            SlotKind::Array { elem, .. } => format!(
                "marshal::collect_array(&mut resp, &binds[{index}], {path:?}, ScalarKind::{elem:?})?;"
            ),
            SlotKind::Cursor { columns } => {
                let columns = columns
                    .iter()
                    .map(|c| format!("({:?}, ScalarKind::{:?})", c.path.to_string(), c.kind))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "marshal::collect_cursor(&mut resp, &mut binds[{index}], {path:?}, &[{columns}], {}, opts)?;",
                    config.cursor_batch_size
                )
            }
            SlotKind::Blob(format) => format!(
                "marshal::collect_blob(&mut resp, &binds[{index}], BlobFormat::{format:?})?;"
            ),
        };
        writeln!(out, "    {line}").unwrap();
    }
    writeln!(out, "    Ok(resp)").unwrap();
    out.push_str("}\n");
    out
}

/// Glue module for one package.
pub fn render_module(package: &str, stubs: &[Stub], config: &GenConfig) -> String {
    let runtime = &config.runtime_path;
    let mut out = String::new();
    writeln!(out, "//! Generated by plcall for package {package}. Do not edit.").unwrap();
    out.push('\n');
    out.push_str("#![allow(unused_imports, unused_mut)]\n\n");
    writeln!(
        out,
        "use {runtime}::{{BlobFormat, CallOptions, Executor, Response, Result, ScalarKind, Value, marshal}};"
    )
    .unwrap();
    for stub in stubs {
        out.push('\n');
        out.push_str(&stub.glue);
    }
    out
}

/// Plain PL/SQL listing of every block, for review and manual testing.
pub fn render_sql(package: &str, stubs: &[Stub]) -> String {
    let mut out = String::new();
    writeln!(out, "-- Generated by plcall for package {package}. Do not edit.").unwrap();
    for stub in stubs {
        out.push('\n');
        writeln!(out, "-- {} ({})", stub.function, stub.plan.ident).unwrap();
        for slot in &stub.plan.slots {
            writeln!(
                out,
                "--   :{} {} {}",
                slot.position,
                slot.direction,
                if slot.path.is_root() { "<request>".to_string() } else { slot.path.to_string() }
            )
            .unwrap();
        }
        out.push_str(&stub.plan.block);
        out.push_str("/\n");
    }
    out
}
