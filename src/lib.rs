// ============================================================================
// ormalias
// ============================================================================
//
// Attribute extraction and reconstitution for objects owned by a persistence
// framework, plugged into a generic serialization engine as a per-class
// strategy.

pub mod config;
pub mod core;
pub mod engine;
pub mod mapped;
pub mod orm;
pub mod prelude;

// Re-export main types for convenience
pub use config::{AliasConfig, DEFAULT_KEY_ATTR, DEFAULT_LAZY_ATTR, FRAMEWORK_INTERNAL_ATTRS};
pub use crate::core::{AliasError, AttributeSets, ClassId, FieldMap, Result, Value};
pub use engine::{ClassAlias, DefaultAlias, Engine, ObjectSnapshot};
pub use mapped::{MAPPED_STRATEGY, MappedClassAlias, MappingDescriptorCache, register_mapped_classes};
pub use orm::{
    ChangeLedger, DomainObject, MappingDescriptor, PersistenceFramework, PropertyDescriptor,
    PropertyKind, is_class_mapped,
};

// ============================================================================
// Engine setup
// ============================================================================

/// Builds an engine with the mapped-class strategy installed for `framework`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ormalias::orm::{MappedClass, MemoryOrm};
/// use ormalias::{AliasConfig, ClassId, Value, engine_for};
///
/// # fn main() -> ormalias::Result<()> {
/// let orm = Arc::new(MemoryOrm::new());
/// orm.map(MappedClass::new("User").primary_key("id").lazy_relationship("orders"))?;
/// let engine = engine_for(orm.clone(), AliasConfig::default())?;
///
/// let mut user = orm.blank(&ClassId::new("User"))?;
/// user.populate("id", Value::from(7));
///
/// let snapshot = engine.snapshot_object(&user)?;
/// assert_eq!(snapshot.static_attrs["orders"], Value::NotLoaded);
/// assert_eq!(snapshot.static_attrs["sa_key"], Value::from(7));
/// # Ok(())
/// # }
/// ```
pub fn engine_for(
    framework: std::sync::Arc<dyn PersistenceFramework>,
    config: AliasConfig,
) -> Result<Engine> {
    let engine = Engine::new();
    register_mapped_classes(&engine, framework, config)?;
    Ok(engine)
}
