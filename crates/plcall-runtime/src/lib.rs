#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Runtime for compiled plcall call plans.
//!
//! The database driver stays outside this crate, behind [`Executor`] and
//! [`RowCursor`]. Everything between the caller's request tree and the
//! driver's positional bind array lives here:
//!
//! - **Marshalling**: building binds from a request and collecting outputs
//!   into a [`Response`] (`marshal`)
//! - **Cursors**: bounded-batch iteration over REF CURSOR results
//! - **LOBs**: in-memory or temp-file materialization of large values
//! - **Blobs**: JSON and XML encoding of whole requests and responses

mod bind;
pub mod blob;
mod convert;
mod cursor;
mod error;
mod exec;
pub mod lob;
pub mod marshal;
mod value;

#[cfg(test)]
mod blob_tests;
#[cfg(test)]
mod cursor_tests;
#[cfg(test)]
mod lob_tests;
#[cfg(test)]
mod marshal_tests;
#[cfg(test)]
pub mod test_utils;

pub use bind::{Bind, OutBox, Stream};
pub use convert::coerce;
pub use cursor::{CursorBatches, RowCursor};
pub use error::{Result, RuntimeError};
pub use exec::{CallOptions, Executor};
pub use marshal::{Response, invoke};
pub use plcall_core::{BlobFormat, CallPlan, CancelToken, ScalarKind, ValuePath};
pub use value::{SpilledLob, Value};
