//! Configuration for the extension.

use std::fmt;
use std::sync::Arc;

use crate::collaborators::{BinderConfig, DefaultBinderConfig};

/// How many connection handles a test class may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleMode {
    /// Any number of named handles; operations route by `sources`.
    #[default]
    Multiple,
    /// Exactly one handle. `sources` must be left at the default and every operation targets that handle, whatever
    /// its name.
    Single,
}

/// Extension settings
#[derive(Clone)]
pub struct ExtensionConfig {
    /// Handle cardinality rules
    pub handle_mode: HandleMode,
    /// Binder configuration used for handles without a `binder_config` declaration
    pub default_binder: Arc<dyn BinderConfig>,
    /// Whether a handle that no operation targets is still submitted with an empty sequence (default `true`)
    pub dispatch_empty_handles: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            handle_mode: HandleMode::Multiple,
            default_binder: Arc::new(DefaultBinderConfig),
            dispatch_empty_handles: true,
        }
    }
}

impl fmt::Debug for ExtensionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionConfig")
            .field("handle_mode", &self.handle_mode)
            .field("dispatch_empty_handles", &self.dispatch_empty_handles)
            .finish_non_exhaustive()
    }
}

impl ExtensionConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handle mode
    pub fn with_handle_mode(mut self, mode: HandleMode) -> Self {
        self.handle_mode = mode;
        self
    }

    /// Set the fallback binder configuration
    pub fn with_default_binder(mut self, binder: Arc<dyn BinderConfig>) -> Self {
        self.default_binder = binder;
        self
    }

    /// Set whether handles that no operation targets are submitted; `false` passes over them
    pub fn with_dispatch_empty_handles(mut self, dispatch: bool) -> Self {
        self.dispatch_empty_handles = dispatch;
        self
    }
}
