//! plcall compiler: catalog type graph, argument trees and code generation.
//!
//! The pipeline, leaves first:
//! - `catalog` - the metadata source interface and the CSV row reader
//! - `typegraph` - cached, cycle-safe resolution of named catalog types
//! - `argtree` - nested function signatures rebuilt from leveled rows
//! - `annotate` - directive overlay (rename, hide, redirect, ...)
//! - `stubgen` - PL/SQL blocks, bind plans and Rust glue per function
//! - `schema` - proto3 messages and services

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod annotate;
pub mod argtree;
pub mod catalog;
mod error;
pub mod schema;
pub mod stubgen;
pub mod typegraph;

#[cfg(test)]
mod error_tests;
#[cfg(test)]
pub mod test_utils;

pub use annotate::{Directive, apply_directives, parse_directives};
pub use argtree::{FunctionFilter, TypeLookup, build_functions, flatten};
pub use catalog::{
    ArgRow, AttrRow, AttrType, Catalog, MemoryCatalog, TypeClass, TypeRow, read_arg_rows,
    read_type_rows,
};
pub use error::{Error, Result};
pub use schema::{SchemaConfig, emit_proto};
pub use stubgen::{
    GenConfig, Naming, Stub, generate, generate_all, render_module, render_sql,
};
pub use typegraph::{GraphConfig, Snapshot, TypeGraph, TypeNode};
