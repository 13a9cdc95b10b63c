//! Declaration scanner.
//!
//! Walks a test class outward through its enclosing classes and upward through its superclasses and collects every
//! marked member as a declaration.
//!
//! ## Notes
//!
//! - Traversal order is enclosing-first, then hierarchy top-down within each class. A class reached twice is scanned
//!   once, at its first position.
//! - The scan position of the declaring class is recorded as the declaration's depth and feeds the ordering
//!   tie-breaker of the plan builder.

use std::collections::HashSet;
use std::sync::Arc;

use dbsetup_core::lang::markers::MarkerId;
use dbsetup_core::trailing_order;

use super::decl::{BinderConfigDecl, DeclSite, Declarations, HandleDecl, OperationDecl};
use crate::diagnostics::{DbSetupError, MemberRef};
use crate::reflect::{Capability, ClassInfo, Marker, MemberInfo, MemberKind};

/// Classes whose members contribute declarations to `class`, in scan order.
pub fn scan_order(class: &Arc<ClassInfo>) -> Vec<Arc<ClassInfo>> {
    let mut order = Vec::new();
    if let Some(enclosing) = class.enclosing() {
        order.extend(scan_order(enclosing));
    }

    let mut hierarchy = vec![Arc::clone(class)];
    let mut current = Arc::clone(class);
    while let Some(parent) = current.superclass().cloned() {
        hierarchy.push(Arc::clone(&parent));
        current = parent;
    }
    hierarchy.reverse();
    order.extend(hierarchy);

    let mut seen = HashSet::new();
    order.retain(|c| seen.insert(c.id()));
    order
}

/// Collect the declarations reachable from `class`.
///
/// ## Errors
///
/// - `TypeMismatch` when a marked member's declared type lacks the capability of its marker.
/// - `MarkerOnMethod` when a handle, operation or binder configuration marker sits on a method.
/// - `SkipNextOnField` when the skip-next marker sits on a field.
#[tracing::instrument(skip_all, fields(class = %class.name()))]
pub fn scan(class: &Arc<ClassInfo>) -> Result<Declarations, DbSetupError> {
    let mut decls = Declarations {
        class: Arc::clone(class),
        handles: Vec::new(),
        operations: Vec::new(),
        binder_configs: Vec::new(),
    };
    let mut seq = 0;

    for (depth, declaring) in scan_order(class).into_iter().enumerate() {
        for (position, member) in declaring.members().iter().enumerate() {
            for marker in member.markers() {
                check_member(&declaring, member, marker)?;
                let site = DeclSite::new(Arc::clone(&declaring), position, depth, seq);
                match marker {
                    Marker::Handle(m) => {
                        decls.handles.push(Arc::new(HandleDecl { site, name: m.name.clone() }));
                    }
                    Marker::Operation(m) => {
                        decls.operations.push(Arc::new(OperationDecl {
                            site,
                            explicit_order: m.order,
                            implicit_order: trailing_order(member.name()),
                            targets: dedup(&m.sources),
                        }));
                    }
                    Marker::BinderConfig(m) => {
                        decls.binder_configs.push(Arc::new(BinderConfigDecl { site, targets: dedup(&m.sources) }));
                    }
                    Marker::SkipNext => continue,
                }
                seq += 1;
            }
        }
    }

    tracing::debug!(
        handles = decls.handles.len(),
        operations = decls.operations.len(),
        binder_configs = decls.binder_configs.len(),
        "scanned declarations"
    );
    Ok(decls)
}

fn check_member(declaring: &ClassInfo, member: &MemberInfo, marker: &Marker) -> Result<(), DbSetupError> {
    let member_ref = || MemberRef::new(declaring.name(), member.name());
    let id = marker.id();

    if id == MarkerId::SkipNext {
        return match member.kind() {
            MemberKind::Method => Ok(()),
            MemberKind::Field => Err(DbSetupError::SkipNextOnField { member: member_ref() }),
        };
    }
    if member.kind() == MemberKind::Method {
        return Err(DbSetupError::MarkerOnMethod { member: member_ref(), marker: marker.spelling().to_string() });
    }

    let required = Capability::required_by(id);
    if member.declared_type().capability() != required {
        return Err(DbSetupError::TypeMismatch {
            member: member_ref(),
            marker: marker.spelling().to_string(),
            expected: required.map(Capability::as_str).unwrap_or("value").to_string(),
            found: member.declared_type().name().to_string(),
        });
    }
    Ok(())
}

fn dedup(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names.iter().filter(|n| seen.insert(n.as_str())).cloned().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::collaborators::Operation;
    use crate::reflect::{DeclaredType, HandleMarker, MemberInfo, OperationMarker};
    use crate::testing::{RecordingHandle, RecordingLog, RecordingOperation};

    struct Outer;
    struct Base;
    struct Leaf;

    fn outer() -> Arc<ClassInfo> {
        ClassInfo::builder::<Outer>("Outer")
            .static_handle("ds", HandleMarker::default(), RecordingHandle::new("DEFAULT", &RecordingLog::new()))
            .static_operation("o1", OperationMarker::default(), RecordingOperation::new("o1"))
            .build()
    }

    fn base() -> Arc<ClassInfo> {
        ClassInfo::builder::<Base>("Base")
            .static_operation("b5", OperationMarker::default(), RecordingOperation::new("b5"))
            .build()
    }

    fn names(decls: &Declarations) -> Vec<String> {
        decls.operations.iter().map(|op| op.site.member_ref().to_string()).collect()
    }

    #[test]
    fn test_scan_order_is_enclosing_first_then_top_down() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf").extends(base()).nested_in(outer()).build();
        let order: Vec<String> = scan_order(&leaf).iter().map(|c| c.name().to_string()).collect();
        assert_eq!(order, vec!["Outer", "Base", "Leaf"]);
    }

    #[test]
    fn test_scan_collects_hierarchy_and_enclosing() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf")
            .extends(base())
            .nested_in(outer())
            .static_operation("l2", OperationMarker::default(), RecordingOperation::new("l2"))
            .build();
        let decls = scan(&leaf).unwrap();
        assert_eq!(decls.handles.len(), 1);
        assert_eq!(names(&decls), vec!["Outer::o1", "Base::b5", "Leaf::l2"]);
        let depths: Vec<usize> = decls.operations.iter().map(|op| op.site.depth()).collect();
        assert_eq!(depths, vec![0, 1, 2]);
    }

    #[test]
    fn test_class_reached_twice_is_scanned_once() {
        let shared = outer();
        let leaf = ClassInfo::builder::<Leaf>("Leaf").extends(Arc::clone(&shared)).nested_in(shared).build();
        let decls = scan(&leaf).unwrap();
        assert_eq!(decls.handles.len(), 1);
        assert_eq!(decls.operations.len(), 1);
    }

    #[test]
    fn test_implicit_order_and_target_dedup() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf")
            .static_operation(
                "insert12",
                OperationMarker::default().with_sources(["A", "B", "A"]),
                RecordingOperation::new("x"),
            )
            .build();
        let decls = scan(&leaf).unwrap();
        let op = &decls.operations[0];
        assert_eq!(op.implicit_order, Some(12));
        assert_eq!(op.effective_order(), Some(12));
        assert_eq!(op.targets, vec!["A", "B"]);
    }

    #[test]
    fn test_marker_on_method_is_rejected() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf")
            .method("make_op", [Marker::Operation(OperationMarker::default())])
            .build();
        let err = scan(&leaf).unwrap_err();
        assert_eq!(err, DbSetupError::MarkerOnMethod {
            member: MemberRef::new("Leaf", "make_op"),
            marker: "operation".to_string(),
        });
    }

    #[test]
    fn test_skip_next_on_field_is_rejected() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf")
            .field(MemberInfo::static_field("flag", DeclaredType::opaque::<bool>(), [Marker::SkipNext], None))
            .build();
        assert!(matches!(scan(&leaf), Err(DbSetupError::SkipNextOnField { .. })));
    }

    #[test]
    fn test_type_mismatch_names_the_declared_type() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf")
            .field(MemberInfo::static_field(
                "not_an_op",
                DeclaredType::opaque::<String>(),
                [Marker::Operation(OperationMarker::default())],
                None,
            ))
            .build();
        match scan(&leaf) {
            Err(DbSetupError::TypeMismatch { expected, found, .. }) => {
                assert_eq!(expected, "operation");
                assert!(found.contains("String"));
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_handle_declared_as_operation_type_mismatches() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf")
            .field(MemberInfo::static_field(
                "ds",
                DeclaredType::operation::<Arc<dyn Operation>>(),
                [Marker::Handle(HandleMarker::default())],
                None,
            ))
            .build();
        assert!(matches!(scan(&leaf), Err(DbSetupError::TypeMismatch { .. })));
    }

    #[test]
    fn test_skip_next_methods_are_not_declarations() {
        let leaf = ClassInfo::builder::<Leaf>("Leaf").skip_next("read_only").build();
        let decls = scan(&leaf).unwrap();
        assert!(decls.handles.is_empty());
        assert!(decls.operations.is_empty());
    }
}
