//! Classes described through `ClassInfo::builder`, static declarations and extension configuration.

use std::any::Any;
use std::sync::{Arc, Mutex, OnceLock};

use dbsetup::collaborators::{BinderConfig, BoxError, Connection, ConnectionHandle, Operation};
use dbsetup::reflect::{ClassBuilder, DeclaredType, HandleMarker, Marker, MemberInfo, OperationMarker};
use dbsetup::testing::{RecordingExecutor, RecordingHandle, RecordingLog, RecordingOperation};
use dbsetup::{
    ClassId, ClassInfo, DbSetupError, DbSetupExtension, DispatchOutcome, ExtensionConfig, ExtensionContext,
    HandleMode, MemberRef, TestClass, TestInstance,
};

fn shared_log() -> &'static RecordingLog {
    static LOG: OnceLock<RecordingLog> = OnceLock::new();
    LOG.get_or_init(RecordingLog::new)
}

// =============================================================================
// Static declarations via a registration hook
// =============================================================================

fn register_statics(builder: ClassBuilder<WithStatics>) -> ClassBuilder<WithStatics> {
    builder.static_operation("cleanup0", OperationMarker::default(), RecordingOperation::new("cleanup0"))
}

#[derive(TestClass)]
#[db_setup(register = register_statics)]
struct WithStatics {
    #[db_setup(handle)]
    db: Arc<RecordingHandle>,
    #[db_setup(operation)]
    insert1: Arc<dyn Operation>,
}

#[test]
fn static_members_join_instance_members() {
    let log = RecordingLog::new();
    let test = WithStatics { db: RecordingHandle::new("DEFAULT", &log), insert1: RecordingOperation::new("insert1") };
    let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
    extension.before_each(&ExtensionContext::for_method(&test, "t")).expect("dispatch");
    assert_eq!(log.entries(), vec!["DEFAULT: cleanup0", "DEFAULT: insert1"]);

    let member = WithStatics::class_info().find_member("cleanup0").map(|(_, m)| m.is_static());
    assert_eq!(member, Some(true));
}

// =============================================================================
// Hand-written descriptors
// =============================================================================

struct HandWritten {
    op2: Arc<dyn Operation>,
}

impl TestClass for HandWritten {
    fn class_info() -> Arc<ClassInfo> {
        ClassInfo::builder::<HandWritten>("HandWritten")
            .static_handle("ds", HandleMarker::named("main"), RecordingHandle::new("main", shared_log()))
            .operation("op2", OperationMarker::default().with_sources(["main"]), |t: &HandWritten| t.op2.clone())
            .build()
    }
}

impl TestInstance for HandWritten {
    fn class_id(&self) -> ClassId {
        ClassId::of::<Self>()
    }

    fn instance_class(&self) -> Arc<ClassInfo> {
        Self::class_info()
    }

    fn as_class(&self, class: ClassId) -> Option<&dyn Any> {
        (class == ClassId::of::<Self>()).then_some(self as &dyn Any)
    }
}

#[test]
fn hand_written_descriptor_dispatches_static_handle() {
    let executor = Arc::new(RecordingExecutor::new());
    let mut extension = DbSetupExtension::new(executor.clone());
    let test = HandWritten { op2: RecordingOperation::new("hand_written_op2") };

    let outcome = extension.before_each(&ExtensionContext::for_method(&test, "t")).expect("dispatch");
    assert_eq!(outcome, DispatchOutcome::Dispatched { handles: vec!["main".to_string()] });
    assert!(shared_log().entries().contains(&"main: hand_written_op2".to_string()));
}

struct Mistyped;

impl TestClass for Mistyped {
    fn class_info() -> Arc<ClassInfo> {
        ClassInfo::builder::<Mistyped>("Mistyped")
            .field(MemberInfo::static_field(
                "db",
                DeclaredType::operation::<Arc<dyn Operation>>(),
                [Marker::Handle(HandleMarker::default())],
                None,
            ))
            .build()
    }
}

impl TestInstance for Mistyped {
    fn class_id(&self) -> ClassId {
        ClassId::of::<Self>()
    }

    fn instance_class(&self) -> Arc<ClassInfo> {
        Self::class_info()
    }

    fn as_class(&self, class: ClassId) -> Option<&dyn Any> {
        (class == ClassId::of::<Self>()).then_some(self as &dyn Any)
    }
}

#[test]
fn mistyped_registration_fails_post_process() {
    let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
    match extension.post_process_test_instance(&Mistyped) {
        Err(DbSetupError::TypeMismatch { member, expected, .. }) => {
            assert_eq!(member, MemberRef::new("Mistyped", "db"));
            assert_eq!(expected, "connection handle");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    assert!(extension.plan_for(ClassId::of::<Mistyped>()).is_none());
}

// =============================================================================
// Single-handle mode
// =============================================================================

#[derive(TestClass)]
struct SingleNamed {
    #[db_setup(handle(name = "reporting"))]
    db: Arc<RecordingHandle>,
    #[db_setup(operation)]
    op1: Arc<dyn Operation>,
}

#[derive(TestClass)]
struct SingleWithSources {
    #[db_setup(handle(name = "reporting"))]
    db: Arc<RecordingHandle>,
    #[db_setup(operation(sources = "reporting"))]
    op1: Arc<dyn Operation>,
}

fn single_mode() -> DbSetupExtension {
    let config = ExtensionConfig::new().with_handle_mode(HandleMode::Single);
    DbSetupExtension::with_config(Arc::new(RecordingExecutor::new()), config)
}

#[test]
fn single_mode_routes_default_operations_to_the_named_handle() {
    let log = RecordingLog::new();
    let test = SingleNamed { db: RecordingHandle::new("reporting", &log), op1: RecordingOperation::new("op1") };
    let mut extension = single_mode();
    let outcome = extension.before_each(&ExtensionContext::for_method(&test, "t")).expect("dispatch");
    assert_eq!(outcome, DispatchOutcome::Dispatched { handles: vec!["reporting".to_string()] });
    assert_eq!(log.entries(), vec!["reporting: op1"]);
}

#[test]
fn single_mode_rejects_sources() {
    let log = RecordingLog::new();
    let test = SingleWithSources { db: RecordingHandle::new("reporting", &log), op1: RecordingOperation::new("op1") };
    let mut extension = single_mode();
    let err = extension.post_process_test_instance(&test).unwrap_err();
    assert_eq!(err, DbSetupError::SourcesNotAllowed { member: MemberRef::new("SingleWithSources", "op1") });
}

// =============================================================================
// Empty handles
// =============================================================================

#[derive(TestClass)]
struct IdleHandle {
    #[db_setup(handle)]
    db: Arc<RecordingHandle>,
    #[db_setup(handle(name = "idle"))]
    idle: Arc<dyn ConnectionHandle>,
    #[db_setup(operation)]
    op1: Arc<dyn Operation>,
}

fn idle_handle(log: &RecordingLog) -> IdleHandle {
    IdleHandle {
        db: RecordingHandle::new("DEFAULT", log),
        idle: RecordingHandle::new("idle", log),
        op1: RecordingOperation::new("op1"),
    }
}

#[test]
fn handles_without_operations_get_an_empty_sequence() {
    let log = RecordingLog::new();
    let test = idle_handle(&log);
    let executor = Arc::new(RecordingExecutor::new());
    let mut extension = DbSetupExtension::new(executor.clone());

    let outcome = extension.before_each(&ExtensionContext::for_method(&test, "t")).expect("dispatch");
    assert_eq!(outcome, DispatchOutcome::Dispatched { handles: vec!["DEFAULT".to_string(), "idle".to_string()] });
    assert_eq!(executor.launch_count(), 2);
    assert_eq!(executor.launches()[1].operation, "sequence_of[]");
    assert_eq!(log.entries(), vec!["DEFAULT: op1"]);
}

#[test]
fn handles_without_operations_can_be_passed_over() {
    let log = RecordingLog::new();
    let test = idle_handle(&log);
    let executor = Arc::new(RecordingExecutor::new());
    let config = ExtensionConfig::new().with_dispatch_empty_handles(false);
    let mut extension = DbSetupExtension::with_config(executor.clone(), config);

    let outcome = extension.before_each(&ExtensionContext::for_method(&test, "t")).expect("dispatch");
    assert_eq!(outcome, DispatchOutcome::Dispatched { handles: vec!["DEFAULT".to_string()] });
    assert_eq!(executor.launch_count(), 1);
}

// =============================================================================
// Static declarations are captured once
// =============================================================================

/// Records the address it runs from, so repeated runs show whether the same value was reused.
struct AddressRecorder {
    seen: Arc<Mutex<Vec<usize>>>,
}

impl Operation for AddressRecorder {
    fn execute(&self, _connection: &mut dyn Connection, _binder: &dyn BinderConfig) -> Result<(), BoxError> {
        let address = self as *const Self as usize;
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(address);
        Ok(())
    }

    fn describe(&self) -> String {
        "address_recorder".to_string()
    }
}

fn recorded_addresses() -> &'static Arc<Mutex<Vec<usize>>> {
    static SEEN: OnceLock<Arc<Mutex<Vec<usize>>>> = OnceLock::new();
    SEEN.get_or_init(Arc::default)
}

struct StaticOnly;

impl TestClass for StaticOnly {
    fn class_info() -> Arc<ClassInfo> {
        static INFO: OnceLock<Arc<ClassInfo>> = OnceLock::new();
        Arc::clone(INFO.get_or_init(|| {
            let recorder = Arc::new(AddressRecorder { seen: Arc::clone(recorded_addresses()) });
            ClassInfo::builder::<StaticOnly>("StaticOnly")
                .static_handle("ds", HandleMarker::default(), RecordingHandle::new("DEFAULT", &RecordingLog::new()))
                .static_operation("cleanup0", OperationMarker::default(), recorder)
                .build()
        }))
    }
}

impl TestInstance for StaticOnly {
    fn class_id(&self) -> ClassId {
        ClassId::of::<Self>()
    }

    fn instance_class(&self) -> Arc<ClassInfo> {
        Self::class_info()
    }

    fn as_class(&self, class: ClassId) -> Option<&dyn Any> {
        (class == ClassId::of::<Self>()).then_some(self as &dyn Any)
    }
}

#[test]
fn static_operation_is_the_same_value_on_every_invocation() {
    let class = StaticOnly::class_info();
    let (_, member) = class.find_member("cleanup0").expect("member");
    let first = member.read(None).and_then(|v| v.into_operation()).expect("value");
    let second = member.read(None).and_then(|v| v.into_operation()).expect("value");
    assert!(Arc::ptr_eq(&first, &second));

    let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
    extension.before_each(&ExtensionContext::for_method(&StaticOnly, "a")).expect("first");
    extension.before_each(&ExtensionContext::for_method(&StaticOnly, "b")).expect("second");

    let seen = recorded_addresses().lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0], Arc::as_ptr(&first) as *const () as usize);
}
