//! Plan builder.
//!
//! An [`ExecutionPlan`] is built once per test class from validated declarations. It fixes, per handle, the binder
//! configuration and the ordered operations. [`ExecutionPlan::resolve`] turns it into values for one invocation.
//!
//! ## Notes
//!
//! - Operations are ordered by `(effective order, declaring-class depth, member position)`. The sort is stable.
//! - An operation targeting several handles appears in each of their lists as the same `Arc`, and its value is read
//!   once per invocation. The same holds for a binder configuration shared by several handles.

use std::collections::HashMap;
use std::sync::Arc;

use super::decl::{BinderConfigDecl, Declarations, Declared, HandleDecl, OperationDecl};
use super::resolver::Resolver;
use crate::collaborators::{BinderConfig, ConnectionHandle, Operation};
use crate::config::HandleMode;
use crate::diagnostics::DbSetupError;
use crate::reflect::{ClassInfo, TestInstance};
use crate::report::{HandleReport, OperationReport, PlanReport};

/// The setup of one handle.
#[derive(Debug, Clone)]
pub struct HandlePlan {
    pub handle: Arc<HandleDecl>,
    pub binder: Option<Arc<BinderConfigDecl>>,
    pub operations: Vec<Arc<OperationDecl>>,
}

/// Immutable per-class plan. Handles keep declaration order.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    class: Arc<ClassInfo>,
    handles: Vec<HandlePlan>,
}

impl ExecutionPlan {
    /// Group and order validated declarations.
    ///
    /// In single-handle mode every operation and binder configuration belongs to the one handle.
    #[tracing::instrument(skip_all, fields(class = %decls.class.name()))]
    pub fn build(decls: &Declarations, mode: HandleMode) -> Self {
        let handles = decls
            .handles
            .iter()
            .map(|handle| {
                let routes_here = |targets: &[String]| match mode {
                    HandleMode::Single => true,
                    HandleMode::Multiple => targets.iter().any(|t| *t == handle.name),
                };
                let mut operations: Vec<Arc<OperationDecl>> =
                    decls.operations.iter().filter(|op| routes_here(op.targets.as_slice())).cloned().collect();
                operations.sort_by_key(|op| {
                    (op.effective_order().unwrap_or(u32::MAX), op.site.depth(), op.site.position())
                });
                let binder = decls.binder_configs.iter().find(|b| routes_here(b.targets.as_slice())).cloned();
                HandlePlan { handle: Arc::clone(handle), binder, operations }
            })
            .collect();

        Self { class: Arc::clone(&decls.class), handles }
    }

    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    pub fn handles(&self) -> &[HandlePlan] {
        &self.handles
    }

    pub fn handle(&self, name: &str) -> Option<&HandlePlan> {
        self.handles.iter().find(|h| h.handle.name == name)
    }

    /// Read every declaration value from `instance` for one invocation.
    ///
    /// ## Errors
    ///
    /// - `InstanceChainFailure` / `MissingValue` from the resolver. Nothing has been dispatched at that point.
    pub fn resolve(
        &self,
        instance: &dyn TestInstance,
        default_binder: &Arc<dyn BinderConfig>,
    ) -> Result<ResolvedPlan, DbSetupError> {
        let mut resolver = Resolver::new(instance);
        let mut operations: HashMap<usize, Arc<dyn Operation>> = HashMap::new();
        let mut binders: HashMap<usize, Arc<dyn BinderConfig>> = HashMap::new();
        let mut handles = Vec::with_capacity(self.handles.len());

        for plan in &self.handles {
            let handle = resolver.read(plan.handle.as_ref())?;
            let binder = match &plan.binder {
                Some(decl) => read_once(&mut resolver, &mut binders, decl.as_ref())?,
                None => Arc::clone(default_binder),
            };

            let mut resolved_ops = Vec::with_capacity(plan.operations.len());
            for op in &plan.operations {
                resolved_ops.push(read_once(&mut resolver, &mut operations, op.as_ref())?);
            }

            handles.push(ResolvedHandle { name: plan.handle.name.clone(), handle, binder, operations: resolved_ops });
        }

        Ok(ResolvedPlan { class: self.class.name().to_string(), handles })
    }

    pub fn report(&self) -> PlanReport {
        PlanReport {
            class: self.class.name().to_string(),
            handles: self
                .handles
                .iter()
                .map(|plan| HandleReport {
                    name: plan.handle.name.clone(),
                    member: plan.handle.site.member_ref(),
                    binder: plan.binder.as_ref().map(|b| b.site.member_ref()),
                    operations: plan
                        .operations
                        .iter()
                        .map(|op| OperationReport {
                            member: op.site.member_ref(),
                            order: op.effective_order().unwrap_or(u32::MAX),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Read `decl` unless this invocation already holds its value.
fn read_once<D: Declared>(
    resolver: &mut Resolver<'_>,
    seen: &mut HashMap<usize, D::Output>,
    decl: &D,
) -> Result<D::Output, DbSetupError>
where
    D::Output: Clone,
{
    let seq = decl.site().seq();
    if let Some(value) = seen.get(&seq) {
        return Ok(value.clone());
    }
    let value = resolver.read(decl)?;
    seen.insert(seq, value.clone());
    Ok(value)
}

/// One handle ready for dispatch.
#[derive(Clone)]
pub struct ResolvedHandle {
    pub name: String,
    pub handle: Arc<dyn ConnectionHandle>,
    pub binder: Arc<dyn BinderConfig>,
    pub operations: Vec<Arc<dyn Operation>>,
}

/// The values of an [`ExecutionPlan`] for one invocation.
#[derive(Clone)]
pub struct ResolvedPlan {
    pub class: String,
    pub handles: Vec<ResolvedHandle>,
}
