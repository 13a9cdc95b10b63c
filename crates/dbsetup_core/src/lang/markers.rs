//! Declaration marker vocabulary.
//!
//! Markers are the `#[db_setup(...)]` attribute forms that turn a test-class member into a declaration. This module
//! centralizes their spellings, the member kind each one may target, their named arguments, and their defaults.

use super::registry::{Example, LangItemInfo, Stability};

/// Name of the helper attribute understood by `#[derive(TestClass)]`.
pub const ATTRIBUTE: &str = "db_setup";

/// Handle name used when a handle marker carries no `name`, and the default `sources` entry.
pub const DEFAULT_HANDLE_NAME: &str = "DEFAULT";

/// Raw `order` value meaning "use the implicit order".
pub const DEFAULT_ORDER: i32 = -1;

/// Named argument for `handle(name = ...)`.
pub const NAME_ARG: &str = "name";

/// Named argument for `operation(order = ...)`.
pub const ORDER_ARG: &str = "order";

/// Named argument for `operation(sources = [...])` and `binder_config(sources = [...])`.
pub const SOURCES_ARG: &str = "sources";

/// Field attribute marking the enclosing-instance back-reference of a nested test class.
pub const ENCLOSING_ATTR: &str = "enclosing";

/// Field attribute marking the embedded superclass part of a test class.
pub const EXTENDS_ATTR: &str = "extends";

/// Container attribute naming an extra registration hook.
pub const REGISTER_ATTR: &str = "register";

/// Container attribute overriding the class display name.
pub const CLASS_NAME_ATTR: &str = "name";

/// Stable identifier for declaration markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerId {
    Handle,
    Operation,
    BinderConfig,
    SkipNext,
}

/// Member kind a marker is allowed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerTarget {
    /// A value captured when the test instance is constructed (or a static).
    Field,
    /// A test method.
    Method,
}

impl MarkerTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerTarget::Field => "field",
            MarkerTarget::Method => "method",
        }
    }
}

/// Metadata entry for a marker.
#[derive(Debug, Clone, Copy)]
pub struct MarkerInfo {
    pub item: LangItemInfo<MarkerId>,
    pub target: MarkerTarget,
    pub args: &'static [&'static str],
}

/// Registry of supported markers.
pub const MARKERS: &[MarkerInfo] = &[
    info(
        MarkerId::Handle,
        "handle",
        &["source"],
        "Declare a connection handle the setup operations run against.",
        MarkerTarget::Field,
        &[NAME_ARG],
        &[Example {
            code: r#"#[db_setup(handle(name = "reporting"))]
reporting: Arc<PgHandle>,"#,
            note: Some("Without `name` the handle is called `DEFAULT`."),
        }],
    ),
    info(
        MarkerId::Operation,
        "operation",
        &[],
        "Declare a setup operation, ordered explicitly or by the trailing digits of its name.",
        MarkerTarget::Field,
        &[ORDER_ARG, SOURCES_ARG],
        &[Example {
            code: r#"#[db_setup(operation(order = 1, sources = ["DEFAULT", "reporting"]))]
delete_all: Arc<dyn Operation>,"#,
            note: None,
        }],
    ),
    info(
        MarkerId::BinderConfig,
        "binder_config",
        &[],
        "Override the parameter binder configuration for one or more handles.",
        MarkerTarget::Field,
        &[SOURCES_ARG],
        &[],
    ),
    info(
        MarkerId::SkipNext,
        "skip_next",
        &[],
        "Skip the database setup before the next test method of the class.",
        MarkerTarget::Method,
        &[],
        &[],
    ),
];

/// Resolve a marker spelling (canonical or alias) to its stable id.
///
/// Matching is case-sensitive.
pub fn from_str(name: &str) -> Option<MarkerId> {
    if let Some(m) = MARKERS.iter().find(|m| m.item.canonical == name) {
        return Some(m.item.id);
    }
    MARKERS
        .iter()
        .find(|m| m.item.aliases.contains(&name))
        .map(|m| m.item.id)
}

/// Return the canonical spelling for a marker.
pub fn as_str(id: MarkerId) -> &'static str {
    info_for(id).item.canonical
}

/// Return the member kind a marker may be placed on.
pub fn target(id: MarkerId) -> MarkerTarget {
    info_for(id).target
}

/// Return the named arguments a marker accepts.
pub fn args(id: MarkerId) -> &'static [&'static str] {
    info_for(id).args
}

/// Return the metadata entry for a marker.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (programming error).
pub fn info_for(id: MarkerId) -> &'static MarkerInfo {
    MARKERS.iter().find(|m| m.item.id == id).expect("marker info missing")
}

const fn info(
    id: MarkerId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    target: MarkerTarget,
    args: &'static [&'static str],
    examples: &'static [Example],
) -> MarkerInfo {
    MarkerInfo {
        item: LangItemInfo {
            id,
            canonical,
            aliases,
            description,
            since_version: Some("0.1.0"),
            stability: Stability::Stable,
            examples,
        },
        target,
        args,
    }
}
