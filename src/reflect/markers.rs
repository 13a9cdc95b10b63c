//! Marker values attached to registered members.

use dbsetup_core::lang::markers::{self as vocab, MarkerId};
use dbsetup_core::{DEFAULT_HANDLE_NAME, DEFAULT_ORDER};

/// A declaration marker on a test-class member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Handle(HandleMarker),
    Operation(OperationMarker),
    BinderConfig(BinderConfigMarker),
    SkipNext,
}

impl Marker {
    pub fn id(&self) -> MarkerId {
        match self {
            Marker::Handle(_) => MarkerId::Handle,
            Marker::Operation(_) => MarkerId::Operation,
            Marker::BinderConfig(_) => MarkerId::BinderConfig,
            Marker::SkipNext => MarkerId::SkipNext,
        }
    }

    /// Canonical spelling, as written inside `#[db_setup(...)]`.
    pub fn spelling(&self) -> &'static str {
        vocab::as_str(self.id())
    }
}

impl From<HandleMarker> for Marker {
    fn from(marker: HandleMarker) -> Self {
        Marker::Handle(marker)
    }
}

impl From<OperationMarker> for Marker {
    fn from(marker: OperationMarker) -> Self {
        Marker::Operation(marker)
    }
}

impl From<BinderConfigMarker> for Marker {
    fn from(marker: BinderConfigMarker) -> Self {
        Marker::BinderConfig(marker)
    }
}

/// `handle(name = ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleMarker {
    pub name: String,
}

impl HandleMarker {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for HandleMarker {
    fn default() -> Self {
        Self::named(DEFAULT_HANDLE_NAME)
    }
}

/// `operation(order = ..., sources = [...])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationMarker {
    /// Raw explicit order; negative means "use the implicit order".
    pub order: i32,
    pub sources: Vec<String>,
}

impl OperationMarker {
    pub fn new(order: i32, sources: Vec<String>) -> Self {
        Self { order, sources }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_sources<S: Into<String>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for OperationMarker {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER, vec![DEFAULT_HANDLE_NAME.to_string()])
    }
}

/// `binder_config(sources = [...])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderConfigMarker {
    pub sources: Vec<String>,
}

impl BinderConfigMarker {
    pub fn new(sources: Vec<String>) -> Self {
        Self { sources }
    }

    pub fn with_sources<S: Into<String>>(mut self, sources: impl IntoIterator<Item = S>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for BinderConfigMarker {
    fn default() -> Self {
        Self::new(vec![DEFAULT_HANDLE_NAME.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_default_handle() {
        assert_eq!(HandleMarker::default().name, "DEFAULT");
        assert_eq!(OperationMarker::default().sources, vec!["DEFAULT"]);
        assert_eq!(OperationMarker::default().order, -1);
        assert_eq!(BinderConfigMarker::default().sources, vec!["DEFAULT"]);
    }

    #[test]
    fn test_with_sources_replaces_default() {
        let marker = OperationMarker::default().with_sources(["A", "B"]);
        assert_eq!(marker.sources, vec!["A", "B"]);
    }

    #[test]
    fn test_spelling_comes_from_registry() {
        assert_eq!(Marker::SkipNext.spelling(), "skip_next");
        assert_eq!(Marker::from(BinderConfigMarker::default()).spelling(), "binder_config");
    }
}
