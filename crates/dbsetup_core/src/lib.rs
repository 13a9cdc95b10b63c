//! Provide the shared, pure vocabulary of the dbsetup test extension.
//!
//! This crate is intentionally small and dependency-free. It holds what both the derive macro and the runtime engine
//! must agree on:
//! - the marker registry (canonical spellings, attribute names, defaults),
//! - the error-kind registry used to classify configuration failures,
//! - the implicit-order helper that turns a member name such as `insert12` into the order `12`.
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no engine-specific types.

pub mod lang;
pub mod order;

pub use lang::markers::{DEFAULT_HANDLE_NAME, DEFAULT_ORDER};
pub use order::{effective_order, trailing_order};
