//! Snapshot tests for user-facing messages and plan reports.
//!
//! Update snapshots: `cargo insta review`

use std::sync::Arc;

use dbsetup::collaborators::Operation;
use dbsetup::testing::{RecordingExecutor, RecordingHandle, RecordingLog, RecordingOperation};
use dbsetup::{DbSetupError, DbSetupExtension, ErrorKind, TestClass, TestInstance};
use miette::Diagnostic;

fn post_process_err(instance: &dyn TestInstance) -> DbSetupError {
    let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
    match extension.post_process_test_instance(instance) {
        Err(err) => err,
        Ok(()) => panic!("expected a validation error"),
    }
}

fn handle() -> Arc<RecordingHandle> {
    RecordingHandle::new("DEFAULT", &RecordingLog::new())
}

#[derive(TestClass)]
struct TwoDefaults {
    #[db_setup(handle)]
    primary: Arc<RecordingHandle>,
    #[db_setup(handle)]
    replica: Arc<RecordingHandle>,
    #[db_setup(operation)]
    op1: Arc<dyn Operation>,
}

#[test]
fn duplicate_default_handle_message() {
    let err = post_process_err(&TwoDefaults { primary: handle(), replica: handle(), op1: RecordingOperation::new("op1") });
    assert_eq!(err.kind(), ErrorKind::DuplicateHandleName);
    insta::assert_snapshot!(
        err.to_string(),
        @"connection handle name `DEFAULT` is declared by both `TwoDefaults::primary` and `TwoDefaults::replica`"
    );
    insta::assert_snapshot!(
        err.help().map(|h| h.to_string()).unwrap_or_default(),
        @"a handle without `name` is called `DEFAULT`; name one of them explicitly"
    );
}

#[derive(TestClass)]
struct NoOrder {
    #[db_setup(handle)]
    db: Arc<RecordingHandle>,
    #[db_setup(operation)]
    cleanup: Arc<dyn Operation>,
}

#[test]
fn unorderable_operation_message() {
    let err = post_process_err(&NoOrder { db: handle(), cleanup: RecordingOperation::new("cleanup") });
    insta::assert_snapshot!(err.to_string(), @"operation `NoOrder::cleanup` has no usable order");
    assert_eq!(err.code().map(|c| c.to_string()).as_deref(), Some("dbsetup::unorderable_operation"));
    assert!(err.is_validation());
}

#[derive(TestClass)]
struct NoHandle {
    #[db_setup(operation)]
    op1: Arc<dyn Operation>,
}

#[test]
fn missing_handle_message() {
    let err = post_process_err(&NoHandle { op1: RecordingOperation::new("op1") });
    insta::assert_snapshot!(err.to_string(), @"test class `NoHandle` declares no connection handle");
}

#[derive(TestClass)]
struct Reported {
    #[db_setup(handle)]
    db: Arc<RecordingHandle>,
    #[db_setup(operation)]
    op2: Arc<dyn Operation>,
    #[db_setup(operation(order = 0))]
    reset: Arc<dyn Operation>,
}

#[test]
fn plan_report_json() {
    let test = Reported { db: handle(), op2: RecordingOperation::new("op2"), reset: RecordingOperation::new("reset") };
    let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
    extension.post_process_test_instance(&test).expect("valid class");

    let report = extension.plan_for(Reported::class_info().id()).expect("plan").report();
    insta::assert_snapshot!(report.to_json().expect("json"), @r#"
    {
      "class": "Reported",
      "handles": [
        {
          "name": "DEFAULT",
          "member": {
            "class": "Reported",
            "member": "db"
          },
          "binder": null,
          "operations": [
            {
              "member": {
                "class": "Reported",
                "member": "reset"
              },
              "order": 0
            },
            {
              "member": {
                "class": "Reported",
                "member": "op2"
              },
              "order": 2
            }
          ]
        }
      ]
    }
    "#);
}
