//! Interfaces of the external collaborators the engine drives.
//!
//! The engine never talks to a database itself. It hands a [`ConnectionHandle`], a (usually composite)
//! [`Operation`] and a [`BinderConfig`] to an [`Executor`]. Implementations of these traits live with the code under
//! test; this module ships only the minimal defaults the engine needs (`DefaultBinderConfig`, `sequence_of`,
//! `ConnectionExecutor`) plus a raw-statement operation.
//!
//! ## Modules
//!
//! - `sequence` - the sequence combinator and the raw `sql` operation
//! - `executor` - the `Executor` seam and its default implementation

pub mod executor;
pub mod sequence;

use std::fmt;

pub use executor::{ConnectionExecutor, Destination, Executor};
pub use sequence::{Sequence, SqlOperation, sequence_of, sql};

/// Boxed error returned by collaborator implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A value bound to a SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

/// Strategy used to bind one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binder {
    /// Let the driver pick.
    Default,
    Text,
    Integer,
    Decimal,
    Timestamp,
    Boolean,
}

/// What is known about a SQL parameter when its binder is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    /// Zero-based parameter position.
    pub index: usize,
    /// Declared SQL type, when the connection reports one.
    pub sql_type: Option<String>,
}

/// A parameter value together with the binder chosen for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub value: SqlValue,
    pub binder: Binder,
}

/// Maps SQL parameter metadata to a binder.
pub trait BinderConfig: Send + Sync {
    fn binder(&self, metadata: &ParameterMetadata) -> Binder;
}

/// Binder configuration used for every handle without an explicit override.
///
/// Chooses a binder from the declared SQL type and falls back to [`Binder::Default`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBinderConfig;

impl BinderConfig for DefaultBinderConfig {
    fn binder(&self, metadata: &ParameterMetadata) -> Binder {
        let Some(sql_type) = metadata.sql_type.as_deref() else {
            return Binder::Default;
        };
        // Strip precision, e.g. `VARCHAR(20)`.
        let base = sql_type.split('(').next().unwrap_or(sql_type).trim().to_ascii_uppercase();
        match base.as_str() {
            "CHAR" | "VARCHAR" | "TEXT" | "CLOB" | "NCHAR" | "NVARCHAR" => Binder::Text,
            "SMALLINT" | "INT" | "INTEGER" | "BIGINT" | "TINYINT" => Binder::Integer,
            "DECIMAL" | "NUMERIC" | "REAL" | "DOUBLE" | "FLOAT" => Binder::Decimal,
            "DATE" | "TIME" | "TIMESTAMP" => Binder::Timestamp,
            "BOOLEAN" | "BOOL" | "BIT" => Binder::Boolean,
            _ => Binder::Default,
        }
    }
}

/// An open database connection.
pub trait Connection: Send {
    /// Execute one statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<u64, BoxError>;

    /// Describe the parameters of a statement before it is executed.
    ///
    /// The default reports `count` untyped parameters.
    fn parameter_metadata(&mut self, _sql: &str, count: usize) -> Result<Vec<ParameterMetadata>, BoxError> {
        Ok((0..count).map(|index| ParameterMetadata { index, sql_type: None }).collect())
    }
}

/// A factory for database connections.
pub trait ConnectionHandle: Send + Sync {
    fn open_connection(&self) -> Result<Box<dyn Connection>, BoxError>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String {
        "connection handle".to_string()
    }
}

/// A unit of database mutation.
pub trait Operation: Send + Sync {
    fn execute(&self, connection: &mut dyn Connection, binder: &dyn BinderConfig) -> Result<(), BoxError>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String {
        "operation".to_string()
    }
}
