//! Runtime view of test-class instances.

use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use super::{ClassId, ClassInfo};

/// A live test-class instance handed to the extension.
///
/// Implemented by `#[derive(TestClass)]`; hand-written impls are fine for classes described with the builder.
pub trait TestInstance: Any {
    /// Class of the most-derived type.
    fn class_id(&self) -> ClassId;

    /// Descriptor of the most-derived type.
    fn instance_class(&self) -> Arc<ClassInfo>;

    /// The part of this instance that belongs to `class`: `self` itself or an embedded superclass value.
    ///
    /// Returns `None` when the instance is not assignable to `class`.
    fn as_class(&self, class: ClassId) -> Option<&dyn Any>;

    /// The instance of the lexically enclosing class, if this is a nested class.
    fn enclosing_instance(&self) -> Option<&dyn TestInstance> {
        None
    }
}

/// A test class with a statically known descriptor.
pub trait TestClass: TestInstance + Sized {
    fn class_info() -> Arc<ClassInfo>;
}

/// A field type that can point at an enclosing instance.
pub trait EnclosingRef {
    type Target: TestClass;

    fn enclosing(&self) -> &dyn TestInstance;
}

impl<T: TestClass> EnclosingRef for Arc<T> {
    type Target = T;

    fn enclosing(&self) -> &dyn TestInstance {
        &**self
    }
}

impl<T: TestClass> EnclosingRef for Box<T> {
    type Target = T;

    fn enclosing(&self) -> &dyn TestInstance {
        &**self
    }
}

impl<T: TestClass> EnclosingRef for Rc<T> {
    type Target = T;

    fn enclosing(&self) -> &dyn TestInstance {
        &**self
    }
}
