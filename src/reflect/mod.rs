//! Static descriptors of test classes.
//!
//! Rust has no runtime reflection, so every test class publishes a [`ClassInfo`] describing its members: name, kind,
//! static-ness, declared type, markers and an accessor. Descriptors come from `#[derive(TestClass)]` or from
//! the [`ClassBuilder`] directly. The engine only ever reads descriptors; it never inspects struct layouts.
//!
//! ## Notes
//!
//! - Static members hold their value directly; it is captured when the descriptor is built.
//! - Member order inside a descriptor is declaration order. The engine uses it as the textual position tie-breaker.
//! - A superclass is modeled as a separate descriptor linked via [`ClassBuilder::extends`]. The derived type embeds
//!   the superclass value and exposes it through [`TestInstance::as_class`].
//! - An enclosing class is linked via [`ClassBuilder::nested_in`]; the nested instance reaches its enclosing instance
//!   through [`TestInstance::enclosing_instance`].

mod instance;
mod markers;

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use dbsetup_core::lang::markers::MarkerId;

use crate::collaborators::{BinderConfig, ConnectionHandle, Operation};

pub use instance::{EnclosingRef, TestClass, TestInstance};
pub use markers::{BinderConfigMarker, HandleMarker, Marker, OperationMarker};

/// Identity of a test class.
///
/// Equality and hashing use the Rust `TypeId`; the type name is kept for messages.
#[derive(Clone, Copy)]
pub struct ClassId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ClassId {
    pub fn of<T: Any>() -> Self {
        Self { type_id: TypeId::of::<T>(), type_name: std::any::type_name::<T>() }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.type_name)
    }
}

/// The collaborator role a declared type can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ConnectionHandle,
    Operation,
    BinderConfig,
}

impl Capability {
    /// Capability a member must have to carry `marker`. `SkipNext` has none.
    pub fn required_by(marker: MarkerId) -> Option<Capability> {
        match marker {
            MarkerId::Handle => Some(Capability::ConnectionHandle),
            MarkerId::Operation => Some(Capability::Operation),
            MarkerId::BinderConfig => Some(Capability::BinderConfig),
            MarkerId::SkipNext => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ConnectionHandle => "connection handle",
            Capability::Operation => "operation",
            Capability::BinderConfig => "binder configuration",
        }
    }
}

/// Declared type of a member, with the capability it is known to satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    name: &'static str,
    capability: Option<Capability>,
}

impl DeclaredType {
    pub fn of<T: ?Sized>(capability: Option<Capability>) -> Self {
        Self { name: std::any::type_name::<T>(), capability }
    }

    /// A type that fills no collaborator role.
    pub fn opaque<T: ?Sized>() -> Self {
        Self::of::<T>(None)
    }

    pub fn connection_handle<T: ?Sized>() -> Self {
        Self::of::<T>(Some(Capability::ConnectionHandle))
    }

    pub fn operation<T: ?Sized>() -> Self {
        Self::of::<T>(Some(Capability::Operation))
    }

    pub fn binder_config<T: ?Sized>() -> Self {
        Self::of::<T>(Some(Capability::BinderConfig))
    }

    pub(crate) fn method() -> Self {
        Self { name: "fn", capability: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capability(&self) -> Option<Capability> {
        self.capability
    }
}

/// A value read from a marked member.
#[derive(Clone)]
pub enum Value {
    Handle(Arc<dyn ConnectionHandle>),
    Operation(Arc<dyn Operation>),
    BinderConfig(Arc<dyn BinderConfig>),
}

impl Value {
    pub fn capability(&self) -> Capability {
        match self {
            Value::Handle(_) => Capability::ConnectionHandle,
            Value::Operation(_) => Capability::Operation,
            Value::BinderConfig(_) => Capability::BinderConfig,
        }
    }

    pub fn into_handle(self) -> Option<Arc<dyn ConnectionHandle>> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn into_operation(self) -> Option<Arc<dyn Operation>> {
        match self {
            Value::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn into_binder_config(self) -> Option<Arc<dyn BinderConfig>> {
        match self {
            Value::BinderConfig(cfg) => Some(cfg),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Handle(h) => write!(f, "Handle({})", h.describe()),
            Value::Operation(op) => write!(f, "Operation({})", op.describe()),
            Value::BinderConfig(_) => write!(f, "BinderConfig"),
        }
    }
}

type InstanceRead = dyn Fn(&dyn Any) -> Option<Value> + Send + Sync;

/// How a field value is read.
#[derive(Clone)]
pub enum Accessor {
    /// Captured when the class is described; every read hands out the same value.
    Static(Option<Value>),
    /// Reads from the declaring class's view of an instance (see [`TestInstance::as_class`]).
    Instance(Arc<InstanceRead>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
}

/// One member of a test class.
#[derive(Clone)]
pub struct MemberInfo {
    name: String,
    kind: MemberKind,
    is_static: bool,
    declared_type: DeclaredType,
    markers: Vec<Marker>,
    accessor: Option<Accessor>,
}

impl MemberInfo {
    /// An instance field of class `T`.
    ///
    /// `read` receives the `T` view of the owning instance; a `None` result means the field holds no value.
    pub fn instance_field<T, F>(
        name: impl Into<String>,
        declared_type: DeclaredType,
        markers: impl IntoIterator<Item = Marker>,
        read: F,
    ) -> Self
    where
        T: Any,
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        let accessor: Arc<InstanceRead> = Arc::new(move |owner: &dyn Any| owner.downcast_ref::<T>().and_then(&read));
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            is_static: false,
            declared_type,
            markers: markers.into_iter().collect(),
            accessor: Some(Accessor::Instance(accessor)),
        }
    }

    /// A class-level field holding `value`.
    ///
    /// The value is captured here, once; reads never rebuild it. `None` means the field holds no value.
    pub fn static_field(
        name: impl Into<String>,
        declared_type: DeclaredType,
        markers: impl IntoIterator<Item = Marker>,
        value: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            is_static: true,
            declared_type,
            markers: markers.into_iter().collect(),
            accessor: Some(Accessor::Static(value)),
        }
    }

    /// A method. Methods carry markers but never values.
    pub fn method(name: impl Into<String>, markers: impl IntoIterator<Item = Marker>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            is_static: false,
            declared_type: DeclaredType::method(),
            markers: markers.into_iter().collect(),
            accessor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared_type
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn has_marker(&self, id: MarkerId) -> bool {
        self.markers.iter().any(|m| m.id() == id)
    }

    pub fn accessor(&self) -> Option<&Accessor> {
        self.accessor.as_ref()
    }

    /// Read the field value. `owner` is the declaring class's view of the instance; static fields ignore it.
    pub fn read(&self, owner: Option<&dyn Any>) -> Option<Value> {
        match self.accessor.as_ref()? {
            Accessor::Static(value) => value.clone(),
            Accessor::Instance(read) => read(owner?),
        }
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("is_static", &self.is_static)
            .field("declared_type", &self.declared_type)
            .field("markers", &self.markers)
            .finish()
    }
}

/// Descriptor of one test class.
pub struct ClassInfo {
    id: ClassId,
    name: String,
    superclass: Option<Arc<ClassInfo>>,
    enclosing: Option<Arc<ClassInfo>>,
    members: Vec<MemberInfo>,
}

impl ClassInfo {
    pub fn builder<T: Any>(name: impl Into<String>) -> ClassBuilder<T> {
        ClassBuilder {
            info: ClassInfo {
                id: ClassId::of::<T>(),
                name: name.into(),
                superclass: None,
                enclosing: None,
                members: Vec::new(),
            },
            _class: PhantomData,
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Arc<ClassInfo>> {
        self.superclass.as_ref()
    }

    pub fn enclosing(&self) -> Option<&Arc<ClassInfo>> {
        self.enclosing.as_ref()
    }

    /// Members declared directly on this class, in declaration order.
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// This class and its superclasses, root first.
    pub fn hierarchy_top_down(&self) -> Vec<&ClassInfo> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.superclass.as_deref() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// True if `self` is `class` or has it as a superclass.
    pub fn is_assignable_to(&self, class: ClassId) -> bool {
        let mut current = Some(self);
        while let Some(info) = current {
            if info.id == class {
                return true;
            }
            current = info.superclass.as_deref();
        }
        false
    }

    /// Find a member by name on this class or, failing that, its superclasses.
    pub fn find_member(&self, name: &str) -> Option<(&ClassInfo, &MemberInfo)> {
        let mut current = Some(self);
        while let Some(info) = current {
            if let Some(member) = info.members.iter().find(|m| m.name == name) {
                return Some((info, member));
            }
            current = info.superclass.as_deref();
        }
        None
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|c| c.name()))
            .field("enclosing", &self.enclosing.as_ref().map(|c| c.name()))
            .field("members", &self.members)
            .finish()
    }
}

/// Builder for a [`ClassInfo`] of the Rust type `T`.
///
/// ## Examples
///
/// ```rust
/// use std::sync::Arc;
/// use dbsetup::reflect::{ClassInfo, HandleMarker, OperationMarker};
/// use dbsetup::collaborators::{ConnectionHandle, Operation};
/// use dbsetup::testing::RecordingHandle;
///
/// struct OrdersTest {
///     db: Arc<RecordingHandle>,
///     insert1: Arc<dyn Operation>,
/// }
///
/// let info = ClassInfo::builder::<OrdersTest>("OrdersTest")
///     .handle("db", HandleMarker::default(), |t| -> Arc<dyn ConnectionHandle> { t.db.clone() })
///     .operation("insert1", OperationMarker::default(), |t| t.insert1.clone())
///     .skip_next("readOnly")
///     .build();
/// assert_eq!(info.members().len(), 3);
/// ```
pub struct ClassBuilder<T> {
    info: ClassInfo,
    _class: PhantomData<fn(&T)>,
}

impl<T: Any> ClassBuilder<T> {
    pub fn extends(mut self, superclass: Arc<ClassInfo>) -> Self {
        self.info.superclass = Some(superclass);
        self
    }

    pub fn nested_in(mut self, enclosing: Arc<ClassInfo>) -> Self {
        self.info.enclosing = Some(enclosing);
        self
    }

    /// Append a fully described member.
    pub fn field(mut self, member: MemberInfo) -> Self {
        self.info.members.push(member);
        self
    }

    pub fn handle<F>(self, name: &str, marker: HandleMarker, read: F) -> Self
    where
        F: Fn(&T) -> Arc<dyn ConnectionHandle> + Send + Sync + 'static,
    {
        self.field(MemberInfo::instance_field::<T, _>(
            name,
            DeclaredType::connection_handle::<Arc<dyn ConnectionHandle>>(),
            [Marker::Handle(marker)],
            move |t| Some(Value::Handle(read(t))),
        ))
    }

    pub fn operation<F>(self, name: &str, marker: OperationMarker, read: F) -> Self
    where
        F: Fn(&T) -> Arc<dyn Operation> + Send + Sync + 'static,
    {
        self.field(MemberInfo::instance_field::<T, _>(
            name,
            DeclaredType::operation::<Arc<dyn Operation>>(),
            [Marker::Operation(marker)],
            move |t| Some(Value::Operation(read(t))),
        ))
    }

    pub fn binder_config<F>(self, name: &str, marker: BinderConfigMarker, read: F) -> Self
    where
        F: Fn(&T) -> Arc<dyn BinderConfig> + Send + Sync + 'static,
    {
        self.field(MemberInfo::instance_field::<T, _>(
            name,
            DeclaredType::binder_config::<Arc<dyn BinderConfig>>(),
            [Marker::BinderConfig(marker)],
            move |t| Some(Value::BinderConfig(read(t))),
        ))
    }

    pub fn static_handle(self, name: &str, marker: HandleMarker, value: Arc<dyn ConnectionHandle>) -> Self {
        self.field(MemberInfo::static_field(
            name,
            DeclaredType::connection_handle::<Arc<dyn ConnectionHandle>>(),
            [Marker::Handle(marker)],
            Some(Value::Handle(value)),
        ))
    }

    pub fn static_operation(self, name: &str, marker: OperationMarker, value: Arc<dyn Operation>) -> Self {
        self.field(MemberInfo::static_field(
            name,
            DeclaredType::operation::<Arc<dyn Operation>>(),
            [Marker::Operation(marker)],
            Some(Value::Operation(value)),
        ))
    }

    pub fn static_binder_config(self, name: &str, marker: BinderConfigMarker, value: Arc<dyn BinderConfig>) -> Self {
        self.field(MemberInfo::static_field(
            name,
            DeclaredType::binder_config::<Arc<dyn BinderConfig>>(),
            [Marker::BinderConfig(marker)],
            Some(Value::BinderConfig(value)),
        ))
    }

    pub fn method(self, name: &str, markers: impl IntoIterator<Item = Marker>) -> Self {
        self.field(MemberInfo::method(name, markers))
    }

    /// Declare a test method that suppresses the setup of the following invocation.
    pub fn skip_next(self, name: &str) -> Self {
        self.method(name, [Marker::SkipNext])
    }

    pub fn build(self) -> Arc<ClassInfo> {
        Arc::new(self.info)
    }
}
