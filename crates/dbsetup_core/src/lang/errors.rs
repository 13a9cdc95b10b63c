//! Configuration error vocabulary.
//!
//! Every failure the extension reports belongs to one stable [`ErrorKind`]. This registry gives each kind its
//! canonical code (used as the `dbsetup::<code>` diagnostic code), a description for docs, and its [`ErrorClass`].

use super::registry::{LangItemInfo, Stability};

/// Stable identifier for configuration and runtime failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingHandle,
    DuplicateHandleName,
    UnknownHandleReference,
    NoTargetHandles,
    TypeMismatch,
    MarkerOnMethod,
    SkipNextOnField,
    MissingOperation,
    UnorderableOperation,
    AmbiguousBinderConfig,
    MultipleHandles,
    SourcesNotAllowed,
    InstanceChainFailure,
    MissingValue,
    ExecutionFailure,
}

/// When a failure is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Detected eagerly while the test instance is post-processed; no invocation of the class dispatches.
    Validation,
    /// Detected while a single invocation runs; only that invocation fails.
    Runtime,
}

/// Metadata entry for an error kind.
#[derive(Debug, Clone, Copy)]
pub struct ErrorKindInfo {
    pub item: LangItemInfo<ErrorKind>,
    pub class: ErrorClass,
}

/// Registry of error kinds.
pub const ERROR_KINDS: &[ErrorKindInfo] = &[
    info(
        ErrorKind::MissingHandle,
        "missing_handle",
        "No connection handle is declared anywhere in the test class hierarchy.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::DuplicateHandleName,
        "duplicate_handle_name",
        "Two connection handles share a name (names are case-sensitive; `DEFAULT` is taken by an unnamed handle).",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::UnknownHandleReference,
        "unknown_handle_reference",
        "An operation or binder configuration lists a source that matches no declared handle.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::NoTargetHandles,
        "no_target_handles",
        "An operation or binder configuration has an empty `sources` list.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::TypeMismatch,
        "type_mismatch",
        "A marked member's declared type does not provide the capability the marker requires.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::MarkerOnMethod,
        "marker_on_method",
        "A handle, operation or binder configuration marker is placed on a method instead of a field.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::SkipNextOnField,
        "skip_next_on_field",
        "The skip-next marker is placed on a field instead of a test method.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::MissingOperation,
        "missing_operation",
        "No setup operation is declared anywhere in the test class hierarchy.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::UnorderableOperation,
        "unorderable_operation",
        "An operation has neither a non-negative `order` nor a member name ending in digits.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::AmbiguousBinderConfig,
        "ambiguous_binder_config",
        "Two binder configurations target the same handle.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::MultipleHandles,
        "multiple_handles",
        "Single-handle mode is enabled but more than one handle is declared.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::SourcesNotAllowed,
        "sources_not_allowed",
        "Single-handle mode is enabled but a declaration names non-default sources.",
        ErrorClass::Validation,
    ),
    info(
        ErrorKind::InstanceChainFailure,
        "instance_chain_failure",
        "The test instance cannot be mapped to the class declaring a member, even through enclosing instances.",
        ErrorClass::Runtime,
    ),
    info(
        ErrorKind::MissingValue,
        "missing_value",
        "A declared member produced no value of the required capability when it was read.",
        ErrorClass::Runtime,
    ),
    info(
        ErrorKind::ExecutionFailure,
        "execution_failure",
        "The executor failed while running the setup operations of a handle.",
        ErrorClass::Runtime,
    ),
];

/// Return the canonical code for an error kind.
pub fn as_str(kind: ErrorKind) -> &'static str {
    info_for(kind).item.canonical
}

/// Return the documentation description for an error kind.
#[inline]
pub fn description(kind: ErrorKind) -> &'static str {
    info_for(kind).item.description
}

/// Return whether an error kind is detected at validation time or at invocation time.
#[inline]
pub fn class(kind: ErrorKind) -> ErrorClass {
    info_for(kind).class
}

/// Resolve a canonical code to an error kind.
///
/// Matching is case-sensitive.
pub fn from_str(code: &str) -> Option<ErrorKind> {
    ERROR_KINDS.iter().find(|e| e.item.canonical == code).map(|e| e.item.id)
}

/// Return full metadata for an error kind.
///
/// ## Panics
/// - If the registry is missing an entry for `kind` (programming error).
pub fn info_for(kind: ErrorKind) -> &'static ErrorKindInfo {
    ERROR_KINDS
        .iter()
        .find(|e| e.item.id == kind)
        .expect("error kind info missing")
}

const fn info(id: ErrorKind, canonical: &'static str, description: &'static str, class: ErrorClass) -> ErrorKindInfo {
    ErrorKindInfo {
        item: LangItemInfo {
            id,
            canonical,
            aliases: &[],
            description,
            since_version: Some("0.1.0"),
            stability: Stability::Stable,
            examples: &[],
        },
        class,
    }
}
