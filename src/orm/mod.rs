//! Contract between this crate and the persistence framework that owns the
//! objects being serialized.
//!
//! The framework is expected to expose three things: a mapping descriptor per
//! class, a per-instance lookup of that descriptor that fails with
//! [`AliasError::UnmanagedType`] for foreign classes, and primary key
//! extraction. Change tracking is reached through [`ChangeLedger`] when the
//! framework keeps one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{AliasError, ClassId, FieldMap, Result, Value};

pub mod collections;
pub mod memory;

pub use collections::{CollectionData, CollectionKind, InstrumentedCollection};
pub use memory::{Entity, InstanceState, MappedClass, MemoryOrm, PlainObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Column,
    Relationship,
}

/// One property declared by a mapping.
///
/// `lazy` is `None` for properties that have no loading strategy at all
/// (plain columns), mirroring frameworks where only relationships carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub key: String,
    pub kind: PropertyKind,
    pub lazy: Option<bool>,
}

impl PropertyDescriptor {
    pub fn column(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: PropertyKind::Column,
            lazy: None,
        }
    }

    pub fn relationship(key: impl Into<String>, lazy: bool) -> Self {
        Self {
            key: key.into(),
            kind: PropertyKind::Relationship,
            lazy: Some(lazy),
        }
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy.unwrap_or(false)
    }
}

/// Per-class mapping as reported by the framework. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDescriptor {
    pub class: ClassId,
    pub properties: Vec<PropertyDescriptor>,
    pub primary_key: Vec<String>,
}

impl MappingDescriptor {
    pub fn iterate_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter()
    }

    pub fn property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|prop| prop.key == key)
    }

    pub fn declares(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    pub fn lazy_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|prop| prop.is_lazy())
    }
}

/// Modification bookkeeping the framework keeps for one instance.
pub trait ChangeLedger {
    /// Has `name` been written since the instance was loaded?
    fn is_modified(&self, name: &str) -> bool;

    /// Drops every trace of `name` from the ledger and the framework's shadow
    /// copy of the instance, so the field reads as never touched.
    fn forget(&mut self, name: &str);

    fn modified_fields(&self) -> Vec<String>;
}

/// A live object whose state may be serialized.
///
/// `fields`/`fields_mut` are the raw field store: writing through them never
/// fires framework hooks. `set_attr` is the tracked path an ordinary
/// assignment would take.
pub trait DomainObject: Send + Sync {
    fn class_id(&self) -> &ClassId;

    fn fields(&self) -> &FieldMap;

    fn fields_mut(&mut self) -> &mut FieldMap;

    fn has_field(&self, name: &str) -> bool {
        self.fields().contains_key(name)
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<()> {
        self.fields_mut().insert(name.to_string(), value);
        Ok(())
    }

    fn change_ledger(&mut self) -> Option<&mut dyn ChangeLedger> {
        None
    }
}

/// The persistence framework as seen from the serialization side.
pub trait PersistenceFramework: Send + Sync {
    fn name(&self) -> &str;

    /// Mapping of a class, or [`AliasError::UnmanagedType`].
    fn class_mapper(&self, class: &ClassId) -> Result<Arc<MappingDescriptor>>;

    /// Mapping of the instance's class, or [`AliasError::UnmanagedType`].
    fn object_mapper(&self, instance: &dyn DomainObject) -> Result<Arc<MappingDescriptor>> {
        self.class_mapper(instance.class_id())
    }

    fn primary_key_from_instance(
        &self,
        mapping: &MappingDescriptor,
        instance: &dyn DomainObject,
    ) -> Result<Value>;
}

/// Whether the framework maps `class`; only `UnmanagedType` counts as "no".
pub fn is_class_mapped(framework: &dyn PersistenceFramework, class: &ClassId) -> Result<bool> {
    match framework.class_mapper(class) {
        Ok(_) => Ok(true),
        Err(AliasError::UnmanagedType(_)) => Ok(false),
        Err(err) => Err(err),
    }
}
