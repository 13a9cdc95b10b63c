//! Dispatcher: submits a resolved plan to the executor.

use crate::collaborators::{Destination, Executor, sequence_of};
use crate::diagnostics::DbSetupError;

use super::plan::ResolvedPlan;

/// Submit every handle of `plan`, in declaration order, and return the names of the handles that were launched.
///
/// A handle that no operation targets still gets an (empty) sequence and a warning. Pass
/// `dispatch_empty_handles = false` to pass over such handles instead.
///
/// ## Errors
///
/// - `ExecutionFailure` for the first handle whose launch fails. Later handles are not attempted.
#[tracing::instrument(skip_all, fields(class = %plan.class))]
pub fn dispatch(
    plan: &ResolvedPlan,
    executor: &dyn Executor,
    dispatch_empty_handles: bool,
) -> Result<Vec<String>, DbSetupError> {
    let mut launched = Vec::with_capacity(plan.handles.len());
    for handle in &plan.handles {
        if handle.operations.is_empty() {
            if !dispatch_empty_handles {
                tracing::warn!(handle = %handle.name, "no operation targets this handle; skipping it");
                continue;
            }
            tracing::warn!(handle = %handle.name, "no operation targets this handle; launching an empty sequence");
        }

        let operation = sequence_of(handle.operations.iter().cloned());
        let destination = Destination::new(handle.name.clone(), handle.handle.clone());
        tracing::info!(handle = %handle.name, operations = handle.operations.len(), "launching db setup");
        executor
            .launch(&destination, operation.as_ref(), handle.binder.as_ref())
            .map_err(|err| DbSetupError::ExecutionFailure { handle: handle.name.clone(), source: err.into() })?;
        launched.push(handle.name.clone());
    }
    Ok(launched)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::collaborators::{BinderConfig, BoxError, DefaultBinderConfig, Operation};
    use crate::engine::plan::ResolvedHandle;
    use crate::testing::{FailingOperation, RecordingExecutor, RecordingHandle, RecordingLog, RecordingOperation};

    fn op(label: &str) -> Arc<dyn Operation> {
        RecordingOperation::new(label)
    }

    fn resolved(log: &RecordingLog, handles: Vec<(&str, Vec<Arc<dyn Operation>>)>) -> ResolvedPlan {
        ResolvedPlan {
            class: "T".to_string(),
            handles: handles
                .into_iter()
                .map(|(name, operations)| ResolvedHandle {
                    name: name.to_string(),
                    handle: RecordingHandle::new(name, log),
                    binder: Arc::new(DefaultBinderConfig),
                    operations,
                })
                .collect(),
        }
    }

    #[test]
    fn test_dispatches_each_handle_as_one_sequence() {
        let log = RecordingLog::new();
        let plan = resolved(&log, vec![
            ("A", vec![op("a1"), op("a2")]),
            ("B", vec![op("b1")]),
        ]);
        let executor = RecordingExecutor::new();
        let launched = dispatch(&plan, &executor, false).unwrap();
        assert_eq!(launched, vec!["A", "B"]);
        assert_eq!(executor.launch_count(), 2);
        assert_eq!(log.entries(), vec!["A: a1", "A: a2", "B: b1"]);
    }

    #[test]
    fn test_first_failure_stops_the_invocation() {
        let log = RecordingLog::new();
        let plan = resolved(&log, vec![
            ("A", vec![op("a1"), FailingOperation::new("constraint violated") as Arc<dyn Operation>]),
            ("B", vec![op("b1")]),
        ]);
        let executor = RecordingExecutor::new();
        let err = dispatch(&plan, &executor, true).unwrap_err();
        assert!(matches!(&err, DbSetupError::ExecutionFailure { handle, .. } if handle == "A"));
        assert_eq!(err.to_string(), "setup of connection handle `A` failed: constraint violated");
        assert_eq!(executor.launch_count(), 1);
        assert_eq!(log.entries(), vec!["A: a1"]);
    }

    #[test]
    fn test_empty_handles_get_an_empty_sequence_unless_opted_out() {
        let log = RecordingLog::new();
        let plan = resolved(&log, vec![("A", vec![op("a1")]), ("B", vec![])]);
        let executor = RecordingExecutor::new();
        assert_eq!(dispatch(&plan, &executor, true).unwrap(), vec!["A", "B"]);
        assert_eq!(executor.launches()[1].operation, "sequence_of[]");
        assert_eq!(dispatch(&plan, &executor, false).unwrap(), vec!["A"]);
    }

    #[derive(Debug, thiserror::Error)]
    #[error("pool exhausted")]
    struct PoolExhausted {
        #[source]
        cause: std::io::Error,
    }

    struct BrokenExecutor;

    impl Executor for BrokenExecutor {
        fn launch(&self, _: &Destination, _: &dyn Operation, _: &dyn BinderConfig) -> Result<(), BoxError> {
            let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
            Err(Box::new(PoolExhausted { cause }))
        }
    }

    #[test]
    fn test_execution_failure_keeps_the_source_chain() {
        let log = RecordingLog::new();
        let plan = resolved(&log, vec![("A", vec![op("a1")])]);
        let err = dispatch(&plan, &BrokenExecutor, true).unwrap_err();

        let chain: Vec<String> =
            std::iter::successors(std::error::Error::source(&err), |e| e.source()).map(|e| e.to_string()).collect();
        assert_eq!(chain, vec!["pool exhausted", "connection refused"]);
        match &err {
            DbSetupError::ExecutionFailure { source, .. } => assert!(source.inner().is::<PoolExhausted>()),
            other => panic!("expected ExecutionFailure, got {other:?}"),
        }
    }
}
