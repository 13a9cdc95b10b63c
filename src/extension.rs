//! The test-runner extension.
//!
//! A runner drives [`DbSetupExtension`] through two hooks:
//! - [`DbSetupExtension::post_process_test_instance`] once the test instance exists: scan, validate and build the plan
//!   of its class (once per class).
//! - [`DbSetupExtension::before_each`] before every test method: consume the skip latch and, unless skipped, resolve
//!   the plan against the instance and dispatch it.
//!
//! ## Notes
//!
//! - A validation failure is stored with the class and returned again by every later hook; nothing of that class is
//!   ever dispatched.
//! - The skip latch is only re-armed after the invocation has been handled, and not at all if dispatch failed.

#![deny(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;

use crate::collaborators::{ConnectionExecutor, Executor};
use crate::config::ExtensionConfig;
use crate::diagnostics::DbSetupError;
use crate::engine::{ExecutionPlan, SkipLatch, dispatch, scan, validate};
use crate::reflect::{ClassId, ClassInfo, TestInstance};

/// The test method about to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMethod {
    name: String,
    skip_next: bool,
}

impl TestMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), skip_next: false }
    }

    /// Mark the method as suppressing the setup of the following invocation.
    pub fn with_skip_next(mut self) -> Self {
        self.skip_next = true;
        self
    }

    /// Look `name` up on `class` (or its superclasses) and take its skip-next marker from the registry.
    ///
    /// A name the registry does not know is a plain method.
    pub fn declared_on(class: &ClassInfo, name: &str) -> Self {
        let skip_next = class
            .find_member(name)
            .is_some_and(|(_, member)| member.has_marker(dbsetup_core::lang::markers::MarkerId::SkipNext));
        Self { name: name.to_string(), skip_next }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_skip_next(&self) -> bool {
        self.skip_next
    }
}

/// What the runner hands to [`DbSetupExtension::before_each`].
pub struct ExtensionContext<'a> {
    pub test_instance: &'a dyn TestInstance,
    pub test_method: TestMethod,
}

impl<'a> ExtensionContext<'a> {
    pub fn new(test_instance: &'a dyn TestInstance, test_method: TestMethod) -> Self {
        Self { test_instance, test_method }
    }

    /// Context for `method`, with its skip-next marker read from the instance's class.
    pub fn for_method(test_instance: &'a dyn TestInstance, method: &str) -> Self {
        let method = TestMethod::declared_on(&test_instance.instance_class(), method);
        Self::new(test_instance, method)
    }
}

/// Result of a successful `before_each`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Setup ran; lists the handles that were launched, in order.
    Dispatched { handles: Vec<String> },
    /// The previous method carried the skip-next marker.
    Skipped,
}

struct ClassState {
    plan: Result<Arc<ExecutionPlan>, DbSetupError>,
    latch: SkipLatch,
}

impl ClassState {
    fn prepare(class: &Arc<ClassInfo>, config: &ExtensionConfig) -> Self {
        let plan = scan(class)
            .and_then(|decls| {
                validate(&decls, config.handle_mode)?;
                Ok(ExecutionPlan::build(&decls, config.handle_mode))
            })
            .map(Arc::new);

        match &plan {
            Ok(plan) => {
                if tracing::enabled!(tracing::Level::DEBUG) {
                    match plan.report().to_json() {
                        Ok(json) => tracing::debug!(class = %class.name(), plan = %json, "prepared db setup plan"),
                        Err(err) => tracing::debug!(class = %class.name(), %err, "plan report unavailable"),
                    }
                }
            }
            Err(err) => tracing::error!(class = %class.name(), code = err.code_str(), "{err}"),
        }

        Self { plan, latch: SkipLatch::new() }
    }
}

/// Runs declared database setup before each test method.
///
/// ## Examples
///
/// ```rust
/// use std::sync::Arc;
/// use dbsetup::collaborators::Operation;
/// use dbsetup::extension::{DbSetupExtension, DispatchOutcome, ExtensionContext};
/// use dbsetup::testing::{RecordingExecutor, RecordingHandle, RecordingLog, RecordingOperation};
/// use dbsetup::TestClass;
///
/// #[derive(TestClass)]
/// #[db_setup(skip_next(reads_only))]
/// struct OrdersTest {
///     #[db_setup(handle)]
///     db: Arc<RecordingHandle>,
///     #[db_setup(operation)]
///     insert1: Arc<dyn Operation>,
/// }
///
/// let log = RecordingLog::new();
/// let test = OrdersTest { db: RecordingHandle::new("DEFAULT", &log), insert1: RecordingOperation::new("insert1") };
/// let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
/// extension.post_process_test_instance(&test).unwrap();
///
/// let outcome = extension.before_each(&ExtensionContext::for_method(&test, "reads_only")).unwrap();
/// assert_eq!(outcome, DispatchOutcome::Dispatched { handles: vec!["DEFAULT".to_string()] });
/// let outcome = extension.before_each(&ExtensionContext::for_method(&test, "writes")).unwrap();
/// assert_eq!(outcome, DispatchOutcome::Skipped);
/// assert_eq!(log.entries(), vec!["DEFAULT: insert1"]);
/// ```
pub struct DbSetupExtension {
    config: ExtensionConfig,
    executor: Arc<dyn Executor>,
    classes: HashMap<ClassId, ClassState>,
}

impl Default for DbSetupExtension {
    fn default() -> Self {
        Self::new(Arc::new(ConnectionExecutor))
    }
}

impl DbSetupExtension {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self::with_config(executor, ExtensionConfig::default())
    }

    pub fn with_config(executor: Arc<dyn Executor>, config: ExtensionConfig) -> Self {
        Self { config, executor, classes: HashMap::new() }
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    fn state(&mut self, instance: &dyn TestInstance) -> &mut ClassState {
        let config = &self.config;
        self.classes
            .entry(instance.class_id())
            .or_insert_with(|| ClassState::prepare(&instance.instance_class(), config))
    }

    /// Prepare the plan of the instance's class. Later calls for the same class only replay the outcome.
    ///
    /// ## Errors
    ///
    /// - Any validation error of the class.
    #[tracing::instrument(skip_all, fields(class = instance.class_id().type_name()))]
    pub fn post_process_test_instance(&mut self, instance: &dyn TestInstance) -> Result<(), DbSetupError> {
        match &self.state(instance).plan {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        }
    }

    /// Run the setup for the method in `context`, or skip it if the previous method asked to.
    ///
    /// Prepares the class first when `post_process_test_instance` was never called for it.
    ///
    /// ## Errors
    ///
    /// - The stored validation error of the class.
    /// - `InstanceChainFailure` / `MissingValue` while reading declaration values.
    /// - `ExecutionFailure` when the executor fails.
    #[tracing::instrument(skip_all, fields(method = %context.test_method.name()))]
    pub fn before_each(&mut self, context: &ExtensionContext<'_>) -> Result<DispatchOutcome, DbSetupError> {
        let executor = Arc::clone(&self.executor);
        let default_binder = Arc::clone(&self.config.default_binder);
        let dispatch_empty_handles = self.config.dispatch_empty_handles;
        let state = self.state(context.test_instance);

        let plan = match &state.plan {
            Ok(plan) => Arc::clone(plan),
            Err(err) => return Err(err.clone()),
        };

        let outcome = if state.latch.begin_invocation() {
            let resolved = plan.resolve(context.test_instance, &default_binder)?;
            let handles = dispatch(&resolved, executor.as_ref(), dispatch_empty_handles)?;
            DispatchOutcome::Dispatched { handles }
        } else {
            tracing::debug!("db setup skipped");
            DispatchOutcome::Skipped
        };

        if context.test_method.is_skip_next() {
            tracing::debug!("Skipping next db setup for {}", context.test_method.name());
            state.latch.arm();
        }
        Ok(outcome)
    }

    /// The prepared plan of a class, if it was prepared successfully.
    pub fn plan_for(&self, class: ClassId) -> Option<&ExecutionPlan> {
        self.classes.get(&class)?.plan.as_ref().ok().map(|plan| plan.as_ref())
    }

    pub fn is_skip_armed(&self, class: ClassId) -> bool {
        self.classes.get(&class).is_some_and(|state| state.latch.is_armed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::collaborators::{ConnectionHandle, Operation};
    use crate::reflect::{HandleMarker, OperationMarker, TestClass};
    use crate::testing::{FailingOperation, RecordingExecutor, RecordingHandle, RecordingLog, RecordingOperation};

    struct Orders {
        db: Arc<dyn ConnectionHandle>,
        op1: Arc<dyn Operation>,
    }

    impl TestClass for Orders {
        fn class_info() -> Arc<ClassInfo> {
            ClassInfo::builder::<Orders>("Orders")
                .handle("db", HandleMarker::default(), |t| t.db.clone())
                .operation("op1", OperationMarker::default(), |t| t.op1.clone())
                .skip_next("quick")
                .build()
        }
    }

    impl TestInstance for Orders {
        fn class_id(&self) -> ClassId {
            ClassId::of::<Orders>()
        }

        fn instance_class(&self) -> Arc<ClassInfo> {
            Self::class_info()
        }

        fn as_class(&self, class: ClassId) -> Option<&dyn Any> {
            (class == ClassId::of::<Orders>()).then_some(self as &dyn Any)
        }
    }

    fn orders(log: &RecordingLog, op: Arc<dyn Operation>) -> Orders {
        Orders { db: RecordingHandle::new("DEFAULT", log), op1: op }
    }

    #[test]
    fn test_declared_on_reads_skip_marker() {
        let class = Orders::class_info();
        assert!(TestMethod::declared_on(&class, "quick").is_skip_next());
        assert!(!TestMethod::declared_on(&class, "other").is_skip_next());
    }

    #[test]
    fn test_lazy_preparation_without_post_process() {
        let log = RecordingLog::new();
        let test = orders(&log, RecordingOperation::new("op1"));
        let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
        let outcome = extension.before_each(&ExtensionContext::new(&test, TestMethod::new("t"))).unwrap();
        assert_eq!(outcome, DispatchOutcome::Dispatched { handles: vec!["DEFAULT".to_string()] });
        assert!(extension.plan_for(ClassId::of::<Orders>()).is_some());
    }

    #[test]
    fn test_failed_dispatch_does_not_arm_latch() {
        let log = RecordingLog::new();
        let test = orders(&log, FailingOperation::new("down"));
        let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
        extension.post_process_test_instance(&test).unwrap();

        let err = extension.before_each(&ExtensionContext::for_method(&test, "quick")).unwrap_err();
        assert!(matches!(err, DbSetupError::ExecutionFailure { .. }));
        assert!(!extension.is_skip_armed(ClassId::of::<Orders>()));
    }

    #[test]
    fn test_skip_marker_arms_after_dispatch() {
        let log = RecordingLog::new();
        let test = orders(&log, RecordingOperation::new("op1"));
        let mut extension = DbSetupExtension::new(Arc::new(RecordingExecutor::new()));
        extension.post_process_test_instance(&test).unwrap();

        extension.before_each(&ExtensionContext::for_method(&test, "quick")).unwrap();
        assert!(extension.is_skip_armed(ClassId::of::<Orders>()));
        let outcome = extension.before_each(&ExtensionContext::for_method(&test, "other")).unwrap();
        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(!extension.is_skip_armed(ClassId::of::<Orders>()));
        assert_eq!(log.entries(), vec!["DEFAULT: op1"]);
    }
}
