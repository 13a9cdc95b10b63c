#![forbid(unsafe_code)]
//! Declarative database setup for test classes.
//!
//! A test class declares connection handles and ordered setup operations on its fields. Before each test method the
//! extension reads those fields from the test instance (following enclosing instances of nested classes and embedded
//! superclass parts), orders the operations per handle and hands each handle's sequence to an [`Executor`].
//!
//! ```text
//! ClassInfo -> scan -> validate -> ExecutionPlan (once per class)
//!                                        |
//! test instance ---------------------> resolve -> dispatch -> Executor (per invocation)
//! ```
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `engine` and `extension`
//!   modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! ## Modules
//!
//! - `reflect` - class descriptors, markers, the `TestClass` / `TestInstance` traits
//! - `engine` - scanner, validator, resolver, plan builder, skip latch, dispatcher
//! - `extension` - the runner-facing hooks
//! - `collaborators` - connection, operation, binder and executor interfaces
//! - `testing` - in-memory collaborators and logging setup for tests

extern crate self as dbsetup;

pub mod collaborators;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod extension;
pub mod reflect;
pub mod report;
pub mod testing;

pub use collaborators::{BinderConfig, ConnectionHandle, Executor, Operation};
pub use config::{ExtensionConfig, HandleMode};
pub use diagnostics::{DbSetupError, LaunchError, MemberRef};
pub use engine::ExecutionPlan;
pub use extension::{DbSetupExtension, DispatchOutcome, ExtensionContext, TestMethod};
pub use reflect::{ClassId, ClassInfo, TestClass, TestInstance};
pub use report::PlanReport;

/// `#[derive(TestClass)]`: generates `TestClass` and `TestInstance` from `#[db_setup(...)]` attributes.
pub use dbsetup_derive::TestClass;

pub use dbsetup_core::lang::errors::ErrorKind;
