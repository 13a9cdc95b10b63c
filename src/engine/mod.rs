//! The binding and dispatch engine.
//!
//! ## Modules
//!
//! - `decl` - declaration records produced by the scanner
//! - `scanner` - walks enclosing classes and superclasses for marked members
//! - `validator` - structural rules over the declarations
//! - `resolver` - maps a test instance to the owner of a declared member
//! - `plan` - per-class execution plan and its per-invocation resolution
//! - `skip_next` - the cross-invocation skip latch
//! - `dispatcher` - submits a resolved plan to the executor

#![deny(clippy::unwrap_used)]

pub mod decl;
pub mod dispatcher;
pub mod plan;
pub mod resolver;
pub mod scanner;
pub mod skip_next;
pub mod validator;

pub use decl::{BinderConfigDecl, DeclSite, Declarations, HandleDecl, OperationDecl};
pub use dispatcher::dispatch;
pub use plan::{ExecutionPlan, HandlePlan, ResolvedHandle, ResolvedPlan};
pub use resolver::{Resolver, owner_of};
pub use scanner::scan;
pub use skip_next::SkipLatch;
pub use validator::validate;
