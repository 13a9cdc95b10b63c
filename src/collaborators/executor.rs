//! The executor seam: where a composite operation meets a connection.

use std::fmt;
use std::sync::Arc;

use super::{BinderConfig, BoxError, ConnectionHandle, Operation};

/// A handle value together with the name it was declared under.
#[derive(Clone)]
pub struct Destination {
    name: String,
    handle: Arc<dyn ConnectionHandle>,
}

impl Destination {
    pub fn new(name: impl Into<String>, handle: Arc<dyn ConnectionHandle>) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &Arc<dyn ConnectionHandle> {
        &self.handle
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("name", &self.name)
            .field("handle", &self.handle.describe())
            .finish()
    }
}

/// Runs an operation against a destination.
///
/// Implement this trait to customize how setup reaches the database (transactions, retries at a lower layer,
/// recording for tests). Failures are reported by returning `Err`.
pub trait Executor {
    fn launch(
        &self,
        destination: &Destination,
        operation: &dyn Operation,
        binder: &dyn BinderConfig,
    ) -> Result<(), BoxError>;
}

/// Opens one connection from the destination's handle and runs the operation on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionExecutor;

impl Executor for ConnectionExecutor {
    fn launch(
        &self,
        destination: &Destination,
        operation: &dyn Operation,
        binder: &dyn BinderConfig,
    ) -> Result<(), BoxError> {
        let mut connection = destination.handle().open_connection()?;
        operation.execute(connection.as_mut(), binder)
    }
}
