//! Sequence combinator and the raw-statement operation.

use std::sync::Arc;

use super::{BinderConfig, BoundParam, BoxError, Connection, Operation, SqlValue};

/// An operation that runs its children in order and stops at the first failure.
pub struct Sequence {
    operations: Vec<Arc<dyn Operation>>,
}

impl Sequence {
    pub fn new(operations: Vec<Arc<dyn Operation>>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Arc<dyn Operation>] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Operation for Sequence {
    fn execute(&self, connection: &mut dyn Connection, binder: &dyn BinderConfig) -> Result<(), BoxError> {
        for operation in &self.operations {
            operation.execute(connection, binder)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.operations.iter().map(|op| op.describe()).collect();
        format!("sequence_of[{}]", parts.join(", "))
    }
}

/// Compose operations into one operation that runs them in the given order.
///
/// The same `Arc` may appear in several sequences; the operation value is shared, not copied.
pub fn sequence_of(operations: impl IntoIterator<Item = Arc<dyn Operation>>) -> Arc<dyn Operation> {
    Arc::new(Sequence::new(operations.into_iter().collect()))
}

/// A single SQL statement passed through to the connection unchanged.
///
/// Parameter binders are chosen by the handle's [`BinderConfig`] from the metadata the connection reports.
#[derive(Debug, Clone)]
pub struct SqlOperation {
    statement: String,
    params: Vec<SqlValue>,
}

impl SqlOperation {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }
}

impl Operation for SqlOperation {
    fn execute(&self, connection: &mut dyn Connection, binder: &dyn BinderConfig) -> Result<(), BoxError> {
        let metadata = connection.parameter_metadata(&self.statement, self.params.len())?;
        let params: Vec<BoundParam> = self
            .params
            .iter()
            .zip(metadata.iter())
            .map(|(value, meta)| BoundParam {
                value: value.clone(),
                binder: binder.binder(meta),
            })
            .collect();
        if params.len() != self.params.len() {
            return Err(format!(
                "connection reported {} parameter(s) for `{}`, {} bound",
                metadata.len(),
                self.statement,
                self.params.len()
            )
            .into());
        }
        connection.execute(&self.statement, &params)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sql({})", self.statement)
    }
}

/// Shorthand for an unparameterized [`SqlOperation`].
pub fn sql(statement: impl Into<String>) -> Arc<dyn Operation> {
    Arc::new(SqlOperation::new(statement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Binder, DefaultBinderConfig, ParameterMetadata};

    #[derive(Default)]
    struct LogConnection {
        log: Vec<(String, Vec<BoundParam>)>,
        fail_on: Option<&'static str>,
    }

    impl Connection for LogConnection {
        fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<u64, BoxError> {
            if self.fail_on == Some(sql) {
                return Err(format!("boom: {sql}").into());
            }
            self.log.push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        fn parameter_metadata(&mut self, _sql: &str, count: usize) -> Result<Vec<ParameterMetadata>, BoxError> {
            Ok((0..count)
                .map(|index| ParameterMetadata {
                    index,
                    sql_type: Some("INTEGER".to_string()),
                })
                .collect())
        }
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let seq = sequence_of(vec![sql("delete from a"), sql("insert into a values (1)")]);
        let mut conn = LogConnection::default();
        seq.execute(&mut conn, &DefaultBinderConfig).unwrap();

        let statements: Vec<&str> = conn.log.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(statements, vec!["delete from a", "insert into a values (1)"]);
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let seq = sequence_of(vec![sql("first"), sql("second"), sql("third")]);
        let mut conn = LogConnection {
            fail_on: Some("second"),
            ..Default::default()
        };
        let err = seq.execute(&mut conn, &DefaultBinderConfig).unwrap_err();

        assert!(err.to_string().contains("boom: second"));
        assert_eq!(conn.log.len(), 1);
    }

    #[test]
    fn test_empty_sequence_is_noop() {
        let seq = Sequence::new(Vec::new());
        let mut conn = LogConnection::default();
        seq.execute(&mut conn, &DefaultBinderConfig).unwrap();
        assert!(seq.is_empty());
        assert!(conn.log.is_empty());
    }

    #[test]
    fn test_sql_operation_binds_through_binder_config() {
        let op = SqlOperation::new("insert into t values (?, ?)").bind(1_i64).bind("x");
        let mut conn = LogConnection::default();
        op.execute(&mut conn, &DefaultBinderConfig).unwrap();

        let (_, params) = &conn.log[0];
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|p| p.binder == Binder::Integer));
        assert_eq!(params[1].value, SqlValue::Text("x".to_string()));
    }

    #[test]
    fn test_sequence_describe() {
        let seq = sequence_of(vec![sql("a"), sql("b")]);
        assert_eq!(seq.describe(), "sequence_of[sql(a), sql(b)]");
    }
}
