//! proto3 projection of generated functions.
//!
//! One service per package with one rpc per function. Request and response
//! messages mirror the value trees the glue reads and writes, so field
//! names match bind paths (`p_order.items`, `ret`). Named record types become
//! shared messages, emitted once.


use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

use plcall_core::utils::{to_pascal_case, to_snake_case, unique_field_names};
use plcall_core::{ArgType, Argument, Function, Scalar, ScalarKind};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Field option number carrying the catalog type.
pub const CATALOG_TYPE_OPTION: u32 = 50501;

/// Configuration for proto emission.
#[derive(Clone, Debug)]
pub struct SchemaConfig {
    /// Attach `(catalog_type)` options to fields
    pub(crate) catalog_types: bool,
    /// Server-streaming rpcs for functions returning cursors
    pub(crate) stream_cursors: bool,
    /// proto package; defaults to the snake_case catalog package
    pub(crate) proto_package: Option<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            catalog_types: true,
            stream_cursors: true,
            proto_package: None,
        }
    }
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog_types(mut self, value: bool) -> Self {
        self.catalog_types = value;
        self
    }

    pub fn stream_cursors(mut self, value: bool) -> Self {
        self.stream_cursors = value;
        self
    }

    pub fn proto_package(mut self, value: impl Into<String>) -> Self {
        self.proto_package = Some(value.into());
        self
    }
}

struct Emitter<'a> {
    config: &'a SchemaConfig,
    used_names: BTreeSet<String>,
    /// Record type name -> message name
    records: HashMap<String, String>,
    messages: Vec<String>,
    timestamp: bool,
}

impl<'a> Emitter<'a> {
    fn new(config: &'a SchemaConfig) -> Self {
        Self {
            config,
            used_names: BTreeSet::new(),
            records: HashMap::new(),
            messages: Vec::new(),
            timestamp: false,
        }
    }

    fn unique_name(&mut self, base: &str) -> String {
        let base = to_pascal_case(base);
        if self.used_names.insert(base.clone()) {
            return base;
        }

        let mut counter = 2;
        loop {
            let name = format!("{}{}", base, counter);
            if self.used_names.insert(name.clone()) {
                return name;
            }
            counter += 1;
        }
    }

    /// Returns the rpc line.
    fn function(&mut self, function: &Function) -> String {
        let rpc = to_pascal_case(&function.ident());
        let input = self.unique_name(&format!("{rpc}Input"));
        let output = self.unique_name(&format!("{rpc}Output"));

        let (names, ret_name) = function.field_names();
        let named: Vec<(String, &Argument)> = names.into_iter().zip(&function.args).collect();
        let inputs: Vec<(String, &Argument)> = named
            .iter()
            .filter(|(_, a)| a.direction.is_input())
            .cloned()
            .collect();
        let mut outputs: Vec<(String, &Argument)> = Vec::new();
        if let (Some(ret), Some(ret_name)) = (&function.returns, ret_name) {
            outputs.push((ret_name, ret));
        }
        outputs.extend(
            named
                .iter()
                .filter(|(_, a)| a.direction.is_output())
                .cloned(),
        );

        self.message(&input, &inputs);
        self.message(&output, &outputs);

        let stream = if self.config.stream_cursors && function.streams() {
            "stream "
        } else {
            ""
        };
        format!("  rpc {rpc} ({input}) returns ({stream}{output}) {{}}")
    }

    fn message(&mut self, name: &str, fields: &[(String, &Argument)]) {
        let mut body = format!("message {name} {{\n");
        for (i, (field, arg)) in fields.iter().enumerate() {
            let (repeated, ty) = self.field_type(name, field, arg);
            let label = if repeated { "repeated " } else { "" };
            write!(body, "  {label}{ty} {field} = {}", i + 1).unwrap();
            if self.config.catalog_types
                && let Some(catalog_type) = catalog_type(arg)
            {
                write!(body, " [(catalog_type) = {catalog_type:?}]").unwrap();
            }
            body.push_str(";\n");
        }
        body.push_str("}\n");
        self.messages.push(body);
    }

    fn field_type(&mut self, parent: &str, field: &str, arg: &Argument) -> (bool, String) {
        match &arg.ty {
            ArgType::Simple(scalar) => (false, self.scalar_type(scalar)),
            ArgType::Record { type_name, fields } => {
                (false, self.record(parent, field, type_name.as_deref(), fields))
            }
            ArgType::Table { elem, .. } => {
                let elem = elem.as_deref().map(|e| &e.ty);
                let ty = match elem {
                    Some(ArgType::Simple(scalar)) => self.scalar_type(scalar),
                    Some(ArgType::Record { type_name, fields }) => {
                        self.record(parent, field, type_name.as_deref(), fields)
                    }
                    // Rejected by `check` before emission.
                    _ => "bytes".to_string(),
                };
                (true, ty)
            }
        }
    }

    fn record(
        &mut self,
        parent: &str,
        field: &str,
        type_name: Option<&str>,
        fields: &[Argument],
    ) -> String {
        if let Some(existing) = type_name.and_then(|t| self.records.get(t)) {
            return existing.clone();
        }
        let base = match type_name {
            Some(t) => t
                .rsplit('.')
                .next()
                .unwrap_or(t)
                .trim_end_matches("%ROWTYPE")
                .to_string(),
            None => format!("{parent}{}", to_pascal_case(field)),
        };
        let name = self.unique_name(&base);
        if let Some(t) = type_name {
            self.records.insert(t.to_string(), name.clone());
        }
        let names = unique_field_names(fields.iter().map(|f| f.name.as_str()));
        let fields: Vec<(String, &Argument)> = names.into_iter().zip(fields).collect();
        self.message(&name, &fields);
        name
    }

    fn scalar_type(&mut self, scalar: &Scalar) -> String {
        match scalar.kind() {
            ScalarKind::Int => {
                let narrow = matches!(
                    scalar.name.as_str(),
                    "PLS_INTEGER"
                        | "BINARY_INTEGER"
                        | "SIMPLE_INTEGER"
                        | "NATURAL"
                        | "NATURALN"
                        | "POSITIVE"
                        | "POSITIVEN"
                        | "SIGNTYPE"
                ) || scalar.precision.is_some_and(|p| p <= 9);
                if narrow { "sint32" } else { "sint64" }.to_string()
            }
            ScalarKind::Float => "double".to_string(),
            ScalarKind::Bool => "bool".to_string(),
            ScalarKind::Decimal | ScalarKind::Text | ScalarKind::Clob => "string".to_string(),
            ScalarKind::Bytes | ScalarKind::Blob => "bytes".to_string(),
            ScalarKind::Timestamp => {
                self.timestamp = true;
                "google.protobuf.Timestamp".to_string()
            }
        }
    }
}

fn catalog_type(arg: &Argument) -> Option<String> {
    match &arg.ty {
        ArgType::Simple(scalar) => Some(scalar.to_string()),
        ArgType::Record { type_name, .. } => type_name.clone(),
        ArgType::Table {
            type_name, cursor, ..
        } => type_name
            .clone()
            .or_else(|| cursor.then(|| "REF CURSOR".to_string())),
    }
}

/// Reject shapes proto cannot express before anything is emitted.
fn check(function: &Function, arg: &Argument, in_element: bool) -> Result<()> {
    match &arg.ty {
        ArgType::Simple(_) => Ok(()),
        ArgType::Record { fields, .. } => {
            if fields.is_empty() {
                return Err(Error::not_supported(
                    function.to_string(),
                    format!("record {:?} has no fields", arg.name),
                ));
            }
            fields.iter().try_for_each(|f| check(function, f, false))
        }
        ArgType::Table { .. } if in_element => Err(Error::not_supported(
            function.to_string(),
            "collection nested inside a collection element",
        )),
        ArgType::Table { elem: None, .. } => Err(Error::MissingElementType {
            function: function.to_string(),
            argument: arg.name.clone(),
        }),
        ArgType::Table {
            elem: Some(elem), ..
        } => check(function, elem, true),
    }
}

/// Render one package as a proto3 file.
///
/// Functions whose arguments cannot be expressed are skipped with a warning.
pub fn emit_proto(package: &str, functions: &[Function], config: &SchemaConfig) -> Result<String> {
    let mut emitter = Emitter::new(config);
    let mut rpcs = Vec::with_capacity(functions.len());
    for function in functions {
        let checked = function
            .args
            .iter()
            .chain(&function.returns)
            .try_for_each(|arg| check(function, arg, false));
        match checked {
            Ok(()) => rpcs.push(emitter.function(function)),
            Err(err) if err.is_skippable() => {
                warn!(function = %function, error = %err, "leaving function out of schema");
            }
            Err(err) => return Err(err),
        }
    }

    let proto_package = config
        .proto_package
        .clone()
        .unwrap_or_else(|| to_snake_case(package));
    let mut out = String::new();
    out.push_str("syntax = \"proto3\";\n\n");
    writeln!(out, "package {proto_package};\n").unwrap();
    out.push_str("import \"google/protobuf/descriptor.proto\";\n");
    if emitter.timestamp {
        out.push_str("import \"google/protobuf/timestamp.proto\";\n");
    }
    out.push('\n');
    out.push_str("extend google.protobuf.FieldOptions {\n");
    writeln!(out, "  string catalog_type = {CATALOG_TYPE_OPTION};").unwrap();
    out.push_str("}\n\n");

    writeln!(out, "service {} {{", to_pascal_case(package)).unwrap();
    for rpc in &rpcs {
        out.push_str(rpc);
        out.push('\n');
    }
    out.push_str("}\n");
    for message in &emitter.messages {
        out.push('\n');
        out.push_str(message);
    }

    debug!(package, rpcs = rpcs.len(), messages = emitter.messages.len(), "emitted proto");
    Ok(out)
}
