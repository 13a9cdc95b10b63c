//! Error type of the extension.
//!
//! Every failure carries a stable [`ErrorKind`] from the `dbsetup_core` registry. Validation kinds are detected once
//! per test class and replayed for every later invocation of that class; runtime kinds fail one invocation only.
//!
//! ## Notes
//!
//! - Diagnostic codes are `dbsetup::<code>` where `<code>` is the registry spelling of the kind. A guard test keeps
//!   the two in sync.
//! - The error is `Clone` so a stored validation failure can be handed out again.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use dbsetup_core::lang::errors::{self, ErrorClass, ErrorKind};
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::collaborators::BoxError;

/// A member of a test class, displayed as `Class::member`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MemberRef {
    pub class: String,
    pub member: String,
}

impl MemberRef {
    pub fn new(class: impl Into<String>, member: impl Into<String>) -> Self {
        Self { class: class.into(), member: member.into() }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.member)
    }
}

/// The error an executor returned, shared so that [`DbSetupError`] stays `Clone`.
///
/// Displays as the executor's error and exposes that error's own `source()` chain. Two values compare equal when
/// their messages do.
#[derive(Debug, Clone)]
pub struct LaunchError(Arc<dyn StdError + Send + Sync + 'static>);

impl LaunchError {
    /// The error exactly as the executor returned it.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl From<BoxError> for LaunchError {
    fn from(err: BoxError) -> Self {
        Self(Arc::from(err))
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for LaunchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl PartialEq for LaunchError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

impl Eq for LaunchError {}

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum DbSetupError {
    #[error("test class `{class}` declares no connection handle")]
    #[diagnostic(code(dbsetup::missing_handle), help("mark a field with `#[db_setup(handle)]`"))]
    MissingHandle { class: String },

    #[error("connection handle name `{name}` is declared by both `{first}` and `{second}`")]
    #[diagnostic(code(dbsetup::duplicate_handle_name))]
    DuplicateHandleName {
        name: String,
        first: MemberRef,
        second: MemberRef,
        #[help]
        hint: Option<String>,
    },

    #[error("`{member}` targets unknown connection handle `{handle}`")]
    #[diagnostic(code(dbsetup::unknown_handle_reference))]
    UnknownHandleReference { member: MemberRef, handle: String },

    #[error("`{member}` has an empty `sources` list")]
    #[diagnostic(code(dbsetup::no_target_handles), help("omit `sources` to target the `DEFAULT` handle"))]
    NoTargetHandles { member: MemberRef },

    #[error("`{member}` is marked `{marker}` but its type `{found}` is not a {expected}")]
    #[diagnostic(code(dbsetup::type_mismatch))]
    TypeMismatch { member: MemberRef, marker: String, expected: String, found: String },

    #[error("marker `{marker}` is placed on method `{member}`")]
    #[diagnostic(code(dbsetup::marker_on_method), help("move the marker to a field"))]
    MarkerOnMethod { member: MemberRef, marker: String },

    #[error("`skip_next` is placed on field `{member}`")]
    #[diagnostic(code(dbsetup::skip_next_on_field), help("`skip_next` marks test methods"))]
    SkipNextOnField { member: MemberRef },

    #[error("test class `{class}` declares no setup operation")]
    #[diagnostic(code(dbsetup::missing_operation), help("mark a field with `#[db_setup(operation)]`"))]
    MissingOperation { class: String },

    #[error("operation `{member}` has no usable order")]
    #[diagnostic(
        code(dbsetup::unorderable_operation),
        help("give it a non-negative `order` or end its name with digits, e.g. `insert1`")
    )]
    UnorderableOperation { member: MemberRef },

    #[error("connection handle `{handle}` has two binder configurations: `{first}` and `{second}`")]
    #[diagnostic(code(dbsetup::ambiguous_binder_config))]
    AmbiguousBinderConfig { handle: String, first: MemberRef, second: MemberRef },

    #[error("test class `{class}` declares {count} connection handles but single-handle mode allows one")]
    #[diagnostic(code(dbsetup::multiple_handles))]
    MultipleHandles { class: String, count: usize },

    #[error("`{member}` names sources but single-handle mode is enabled")]
    #[diagnostic(code(dbsetup::sources_not_allowed), help("remove `sources` or switch to multiple-handle mode"))]
    SourcesNotAllowed { member: MemberRef },

    #[error("instance of `{instance}` cannot reach the class declaring `{member}`")]
    #[diagnostic(code(dbsetup::instance_chain_failure))]
    InstanceChainFailure { member: MemberRef, instance: String },

    #[error("`{member}` holds no {expected}")]
    #[diagnostic(code(dbsetup::missing_value))]
    MissingValue { member: MemberRef, expected: String },

    #[error("setup of connection handle `{handle}` failed: {source}")]
    #[diagnostic(code(dbsetup::execution_failure))]
    ExecutionFailure {
        handle: String,
        #[source]
        source: LaunchError,
    },
}

impl DbSetupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbSetupError::MissingHandle { .. } => ErrorKind::MissingHandle,
            DbSetupError::DuplicateHandleName { .. } => ErrorKind::DuplicateHandleName,
            DbSetupError::UnknownHandleReference { .. } => ErrorKind::UnknownHandleReference,
            DbSetupError::NoTargetHandles { .. } => ErrorKind::NoTargetHandles,
            DbSetupError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            DbSetupError::MarkerOnMethod { .. } => ErrorKind::MarkerOnMethod,
            DbSetupError::SkipNextOnField { .. } => ErrorKind::SkipNextOnField,
            DbSetupError::MissingOperation { .. } => ErrorKind::MissingOperation,
            DbSetupError::UnorderableOperation { .. } => ErrorKind::UnorderableOperation,
            DbSetupError::AmbiguousBinderConfig { .. } => ErrorKind::AmbiguousBinderConfig,
            DbSetupError::MultipleHandles { .. } => ErrorKind::MultipleHandles,
            DbSetupError::SourcesNotAllowed { .. } => ErrorKind::SourcesNotAllowed,
            DbSetupError::InstanceChainFailure { .. } => ErrorKind::InstanceChainFailure,
            DbSetupError::MissingValue { .. } => ErrorKind::MissingValue,
            DbSetupError::ExecutionFailure { .. } => ErrorKind::ExecutionFailure,
        }
    }

    /// Registry code of the kind, e.g. `missing_handle`.
    pub fn code_str(&self) -> &'static str {
        errors::as_str(self.kind())
    }

    /// True for failures detected while preparing a class (as opposed to while dispatching).
    pub fn is_validation(&self) -> bool {
        errors::class(self.kind()) == ErrorClass::Validation
    }

    pub(crate) fn duplicate_handle(name: &str, first: MemberRef, second: MemberRef) -> Self {
        let hint = (name == dbsetup_core::DEFAULT_HANDLE_NAME)
            .then(|| "a handle without `name` is called `DEFAULT`; name one of them explicitly".to_string());
        DbSetupError::DuplicateHandleName { name: name.to_string(), first, second, hint }
    }
}
