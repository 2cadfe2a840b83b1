#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for plcall.
//!
//! - **Model**: functions, arguments and flavors rebuilt from catalog rows
//! - **Types**: structural definitions of named catalog types
//! - **Names**: partial type references and their canonical keys
//! - **Plan**: the compiled call format shared by compiler and runtime

mod cancel;
pub mod model;
pub mod name;
pub mod plan;
pub mod types;
pub mod utils;

#[cfg(test)]
mod plan_tests;

pub use cancel::CancelToken;
pub use model::{ArgType, Argument, Direction, Flavor, Function, RETURN_FIELD, Replacement};
pub use name::{CanonicalName, NameError, QualifiedName, TypeName};
pub use plan::{
    BindSlot, BlobFormat, CallPlan, Column, PathSeg, SlotKind, SlotSource, ValuePath,
};
pub use types::{Field, IndexBy, Scalar, ScalarKind, TypeDef, TypeRef};
