//! Instance resolution: from a test instance to the object that owns a declared member.
//!
//! A member declared on class `D` is read from the first object in the chain `instance, enclosing(instance), ...`
//! that is assignable to `D`. Static members need no owner.

use std::any::Any;
use std::collections::HashMap;

use super::decl::{DeclSite, Declared};
use crate::diagnostics::DbSetupError;
use crate::reflect::{ClassId, TestInstance};

/// The part of `instance` (or of one of its enclosing instances) that belongs to `declaring`.
pub fn owner_of<'a>(declaring: ClassId, instance: &'a dyn TestInstance) -> Option<&'a dyn Any> {
    let mut current = Some(instance);
    while let Some(candidate) = current {
        if let Some(view) = candidate.as_class(declaring) {
            return Some(view);
        }
        current = candidate.enclosing_instance();
    }
    None
}

/// Reads declaration values for one invocation.
///
/// Owners are memoized per declaring class; the resolver lives no longer than the invocation.
pub struct Resolver<'a> {
    instance: &'a dyn TestInstance,
    owners: HashMap<ClassId, &'a dyn Any>,
}

impl<'a> Resolver<'a> {
    pub fn new(instance: &'a dyn TestInstance) -> Self {
        Self { instance, owners: HashMap::new() }
    }

    fn owner(&mut self, site: &DeclSite) -> Result<&'a dyn Any, DbSetupError> {
        let declaring = site.declaring_class().id();
        if let Some(owner) = self.owners.get(&declaring) {
            return Ok(*owner);
        }
        let owner = owner_of(declaring, self.instance).ok_or_else(|| DbSetupError::InstanceChainFailure {
            member: site.member_ref(),
            instance: self.instance.instance_class().name().to_string(),
        })?;
        self.owners.insert(declaring, owner);
        Ok(owner)
    }

    /// Read the value of a declaration.
    ///
    /// ## Errors
    ///
    /// - `InstanceChainFailure` when no object in the enclosing chain is assignable to the declaring class.
    /// - `MissingValue` when the member holds nothing, or something of the wrong capability.
    pub fn read<D: Declared>(&mut self, decl: &D) -> Result<D::Output, DbSetupError> {
        let site = decl.site();
        let member = site.member();
        let owner = if member.is_static() { None } else { Some(self.owner(site)?) };

        match member.read(owner).and_then(D::extract) {
            Some(value) => Ok(value),
            None => Err(DbSetupError::MissingValue {
                member: site.member_ref(),
                expected: D::CAPABILITY.as_str().to_string(),
            }),
        }
    }
}
