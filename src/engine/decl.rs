//! Declarations collected by the scanner.

use std::fmt;
use std::sync::Arc;

use dbsetup_core::effective_order;

use crate::collaborators::{BinderConfig, ConnectionHandle, Operation};
use crate::diagnostics::MemberRef;
use crate::reflect::{Capability, ClassInfo, MemberInfo, Value};

/// Where a declaration lives: its declaring class and member, plus the keys used for stable ordering.
#[derive(Clone)]
pub struct DeclSite {
    class: Arc<ClassInfo>,
    position: usize,
    depth: usize,
    seq: usize,
}

impl DeclSite {
    pub(crate) fn new(class: Arc<ClassInfo>, position: usize, depth: usize, seq: usize) -> Self {
        Self { class, position, depth, seq }
    }

    pub fn declaring_class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    pub fn member(&self) -> &MemberInfo {
        &self.class.members()[self.position]
    }

    pub fn is_static(&self) -> bool {
        self.member().is_static()
    }

    /// Textual position of the member within its declaring class.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Rank of the declaring class in scan order; 0 is the outermost, topmost class.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Unique scan sequence number across all declarations of a class run.
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn member_ref(&self) -> MemberRef {
        MemberRef::new(self.class.name(), self.member().name())
    }
}

impl fmt::Debug for DeclSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.member_ref())
    }
}

#[derive(Debug, Clone)]
pub struct HandleDecl {
    pub site: DeclSite,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct OperationDecl {
    pub site: DeclSite,
    /// Raw `order`; negative means absent.
    pub explicit_order: i32,
    /// Trailing digits of the member name, when it has any that fit.
    pub implicit_order: Option<u32>,
    /// Target handle names, duplicates removed, first occurrence kept.
    pub targets: Vec<String>,
}

impl OperationDecl {
    /// Explicit order when non-negative, else the implicit one.
    pub fn effective_order(&self) -> Option<u32> {
        effective_order(self.explicit_order, self.implicit_order)
    }

    pub fn targets_handle(&self, name: &str) -> bool {
        self.targets.iter().any(|t| t == name)
    }
}

#[derive(Debug, Clone)]
pub struct BinderConfigDecl {
    pub site: DeclSite,
    pub targets: Vec<String>,
}

impl BinderConfigDecl {
    pub fn targets_handle(&self, name: &str) -> bool {
        self.targets.iter().any(|t| t == name)
    }
}

/// Everything the scanner found for one test class.
#[derive(Debug, Clone)]
pub struct Declarations {
    pub class: Arc<ClassInfo>,
    pub handles: Vec<Arc<HandleDecl>>,
    pub operations: Vec<Arc<OperationDecl>>,
    pub binder_configs: Vec<Arc<BinderConfigDecl>>,
}

/// A declaration kind together with the value type it resolves to.
pub trait Declared {
    type Output;

    const CAPABILITY: Capability;

    fn site(&self) -> &DeclSite;

    fn extract(value: Value) -> Option<Self::Output>;
}

impl Declared for HandleDecl {
    type Output = Arc<dyn ConnectionHandle>;

    const CAPABILITY: Capability = Capability::ConnectionHandle;

    fn site(&self) -> &DeclSite {
        &self.site
    }

    fn extract(value: Value) -> Option<Self::Output> {
        value.into_handle()
    }
}

impl Declared for OperationDecl {
    type Output = Arc<dyn Operation>;

    const CAPABILITY: Capability = Capability::Operation;

    fn site(&self) -> &DeclSite {
        &self.site
    }

    fn extract(value: Value) -> Option<Self::Output> {
        value.into_operation()
    }
}

impl Declared for BinderConfigDecl {
    type Output = Arc<dyn BinderConfig>;

    const CAPABILITY: Capability = Capability::BinderConfig;

    fn site(&self) -> &DeclSite {
        &self.site
    }

    fn extract(value: Value) -> Option<Self::Output> {
        value.into_binder_config()
    }
}
