//! Structural validation of scanned declarations.
//!
//! Rules run in a fixed order and the first violation is reported:
//! 1. at least one handle,
//! 2. unique handle names (single-handle mode: at most one handle),
//! 3. at least one operation,
//! 4. operation targets are non-empty and resolve (single-handle mode: no `sources` at all),
//! 5. every operation has an order,
//! 6. binder configuration targets resolve and never collide.

use std::collections::HashMap;

use dbsetup_core::DEFAULT_HANDLE_NAME;

use super::decl::{DeclSite, Declarations};
use crate::config::HandleMode;
use crate::diagnostics::DbSetupError;

#[tracing::instrument(skip_all, fields(class = %decls.class.name(), mode = ?mode))]
pub fn validate(decls: &Declarations, mode: HandleMode) -> Result<(), DbSetupError> {
    let class = decls.class.name();

    if decls.handles.is_empty() {
        return Err(DbSetupError::MissingHandle { class: class.to_string() });
    }

    if mode == HandleMode::Single && decls.handles.len() > 1 {
        return Err(DbSetupError::MultipleHandles { class: class.to_string(), count: decls.handles.len() });
    }
    let mut handles: HashMap<&str, &DeclSite> = HashMap::new();
    for handle in &decls.handles {
        if let Some(first) = handles.insert(handle.name.as_str(), &handle.site) {
            return Err(DbSetupError::duplicate_handle(&handle.name, first.member_ref(), handle.site.member_ref()));
        }
    }

    if decls.operations.is_empty() {
        return Err(DbSetupError::MissingOperation { class: class.to_string() });
    }

    for op in &decls.operations {
        check_targets(&op.site, &op.targets, &handles, mode)?;
    }

    for op in &decls.operations {
        if op.effective_order().is_none() {
            return Err(DbSetupError::UnorderableOperation { member: op.site.member_ref() });
        }
    }

    let mut bound: HashMap<&str, &DeclSite> = HashMap::new();
    for binder in &decls.binder_configs {
        check_targets(&binder.site, &binder.targets, &handles, mode)?;
        for target in &binder.targets {
            if let Some(first) = bound.insert(target.as_str(), &binder.site) {
                return Err(DbSetupError::AmbiguousBinderConfig {
                    handle: target.clone(),
                    first: first.member_ref(),
                    second: binder.site.member_ref(),
                });
            }
        }
    }

    tracing::debug!("declarations are valid");
    Ok(())
}

fn check_targets(
    site: &DeclSite,
    targets: &[String],
    handles: &HashMap<&str, &DeclSite>,
    mode: HandleMode,
) -> Result<(), DbSetupError> {
    if mode == HandleMode::Single {
        if targets.len() != 1 || targets[0] != DEFAULT_HANDLE_NAME {
            return Err(DbSetupError::SourcesNotAllowed { member: site.member_ref() });
        }
        return Ok(());
    }

    if targets.is_empty() {
        return Err(DbSetupError::NoTargetHandles { member: site.member_ref() });
    }
    if let Some(unknown) = targets.iter().find(|t| !handles.contains_key(t.as_str())) {
        return Err(DbSetupError::UnknownHandleReference { member: site.member_ref(), handle: unknown.clone() });
    }
    Ok(())
}
