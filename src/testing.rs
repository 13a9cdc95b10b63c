//! In-memory collaborators for exercising the extension without a database.
//!
//! ## Notes
//!
//! - `RecordingHandle` hands out connections that append `"<handle>: <statement>"` to a shared [`RecordingLog`].
//! - `RecordingOperation` executes its label as the statement, so the log shows which handle ran which operation.
//! - `RecordingExecutor` wraps [`ConnectionExecutor`] and additionally records every launch.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::collaborators::{
    Binder, BinderConfig, BoundParam, BoxError, Connection, ConnectionExecutor, ConnectionHandle, Destination, Executor,
    Operation, ParameterMetadata,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared, append-only statement log.
#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

/// A connection handle whose connections write to a [`RecordingLog`].
#[derive(Debug, Clone)]
pub struct RecordingHandle {
    name: String,
    log: RecordingLog,
}

impl RecordingHandle {
    pub fn new(name: impl Into<String>, log: &RecordingLog) -> Arc<Self> {
        Arc::new(Self { name: name.into(), log: log.clone() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ConnectionHandle for RecordingHandle {
    fn open_connection(&self) -> Result<Box<dyn Connection>, BoxError> {
        Ok(Box::new(RecordingConnection { handle: self.name.clone(), log: self.log.clone() }))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

struct RecordingConnection {
    handle: String,
    log: RecordingLog,
}

impl Connection for RecordingConnection {
    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<u64, BoxError> {
        if params.is_empty() {
            self.log.push(format!("{}: {sql}", self.handle));
        } else {
            let values: Vec<String> = params.iter().map(|p| p.value.to_string()).collect();
            self.log.push(format!("{}: {sql} [{}]", self.handle, values.join(", ")));
        }
        Ok(1)
    }
}

/// Executes its label as a statement.
#[derive(Debug, Clone)]
pub struct RecordingOperation {
    label: String,
}

impl RecordingOperation {
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { label: label.into() })
    }
}

impl Operation for RecordingOperation {
    fn execute(&self, connection: &mut dyn Connection, _binder: &dyn BinderConfig) -> Result<(), BoxError> {
        connection.execute(&self.label, &[])?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Always fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingOperation {
    message: String,
}

impl FailingOperation {
    pub fn new(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { message: message.into() })
    }
}

impl Operation for FailingOperation {
    fn execute(&self, _connection: &mut dyn Connection, _binder: &dyn BinderConfig) -> Result<(), BoxError> {
        Err(self.message.clone().into())
    }

    fn describe(&self) -> String {
        format!("failing({})", self.message)
    }
}

/// Binds every parameter with the same binder.
#[derive(Debug, Clone, Copy)]
pub struct FixedBinderConfig(pub Binder);

impl BinderConfig for FixedBinderConfig {
    fn binder(&self, _metadata: &ParameterMetadata) -> Binder {
        self.0
    }
}

/// One call to [`Executor::launch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub handle: String,
    pub operation: String,
    /// What the binder configuration answers for an untyped parameter.
    pub binder: Binder,
}

/// Records launches, then runs them through [`ConnectionExecutor`].
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    launches: Arc<Mutex<Vec<Launch>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launches(&self) -> Vec<Launch> {
        lock(&self.launches).clone()
    }

    pub fn launch_count(&self) -> usize {
        lock(&self.launches).len()
    }
}

impl Executor for RecordingExecutor {
    fn launch(
        &self,
        destination: &Destination,
        operation: &dyn Operation,
        binder: &dyn BinderConfig,
    ) -> Result<(), BoxError> {
        let probe = ParameterMetadata { index: 0, sql_type: None };
        lock(&self.launches).push(Launch {
            handle: destination.name().to_string(),
            operation: operation.describe(),
            binder: binder.binder(&probe),
        });
        ConnectionExecutor.launch(destination, operation, binder)
    }
}

/// Install a `tracing` subscriber honoring `RUST_LOG` (default `info`). Safe to call more than once.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
