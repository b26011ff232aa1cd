//! Generic serialization engine seam.
//!
//! The engine knows nothing about persistence: it asks the alias registered
//! for an object's class for attributes, runs them through the type adapters
//! and hands them to a codec. Decoding goes the other way through the same
//! alias.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::core::{AliasError, ClassId, FieldMap, Result, Value};
use crate::orm::DomainObject;

pub mod alias;
pub mod codec;
pub mod registry;

pub use alias::{ClassAlias, DefaultAlias};
pub use codec::ObjectSnapshot;
pub use registry::{
    AliasFactory, AliasPredicate, AliasRegistry, TypeAdapterRegistry, ValueConverter,
    ValuePredicate,
};

pub type InstanceFactory = Arc<dyn Fn() -> Result<Box<dyn DomainObject>> + Send + Sync>;

pub struct Engine {
    aliases: AliasRegistry,
    adapters: TypeAdapterRegistry,
    factories: RwLock<HashMap<ClassId, InstanceFactory>>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            aliases: AliasRegistry::new(),
            adapters: TypeAdapterRegistry::new(),
            factories: RwLock::new(HashMap::new()),
        }
    }

    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    pub fn adapters(&self) -> &TypeAdapterRegistry {
        &self.adapters
    }

    pub fn register_alias_type(
        &self,
        name: &str,
        predicate: AliasPredicate,
        factory: AliasFactory,
    ) -> Result<()> {
        self.aliases.register_alias_type(name, predicate, factory)
    }

    pub fn add_type(
        &self,
        name: &str,
        predicate: ValuePredicate,
        convert: ValueConverter,
    ) -> Result<()> {
        self.adapters.add_type(name, predicate, convert)
    }

    /// Registers how to allocate a blank instance of `class` for decoding.
    pub fn register_factory(&self, class: ClassId, factory: InstanceFactory) -> Result<()> {
        debug!("registered instance factory for {}", class);
        self.factories.write()?.insert(class, factory);
        Ok(())
    }

    pub fn alias_for(&self, class: &ClassId) -> Result<Arc<dyn ClassAlias>> {
        self.aliases.alias_for(class)
    }

    pub fn snapshot_object(&self, obj: &dyn DomainObject) -> Result<ObjectSnapshot> {
        let alias = self.alias_for(obj.class_id())?;
        let (static_attrs, dynamic_attrs) = alias.get_attributes(obj)?;

        Ok(ObjectSnapshot {
            class: obj.class_id().clone(),
            static_attrs: self.adapt_map(static_attrs)?,
            dynamic_attrs: self.adapt_map(dynamic_attrs)?,
        })
    }

    /// Applies `snapshot` onto an existing instance of the same class.
    pub fn restore_object(
        &self,
        snapshot: &ObjectSnapshot,
        target: &mut dyn DomainObject,
    ) -> Result<()> {
        if target.class_id() != &snapshot.class {
            return Err(AliasError::MalformedSnapshot(format!(
                "snapshot of class '{}' applied to instance of '{}'",
                snapshot.class,
                target.class_id()
            )));
        }

        let alias = self.alias_for(&snapshot.class)?;
        alias.apply_attributes(target, snapshot.merged_attrs())
    }

    /// Allocates a blank instance through the registered factory and restores
    /// `snapshot` onto it.
    pub fn instantiate(&self, snapshot: &ObjectSnapshot) -> Result<Box<dyn DomainObject>> {
        let factory = self
            .factories
            .read()?
            .get(&snapshot.class)
            .cloned()
            .ok_or_else(|| AliasError::UnknownClass(snapshot.class.to_string()))?;

        let mut instance = factory()?;
        self.restore_object(snapshot, instance.as_mut())?;
        Ok(instance)
    }

    pub fn encode_json(&self, obj: &dyn DomainObject) -> Result<String> {
        codec::to_json(&self.snapshot_object(obj)?)
    }

    pub fn decode_json(&self, json: &str) -> Result<ObjectSnapshot> {
        codec::from_json(json)
    }

    pub fn encode_msgpack(&self, obj: &dyn DomainObject) -> Result<Vec<u8>> {
        codec::to_msgpack(&self.snapshot_object(obj)?)
    }

    pub fn decode_msgpack(&self, bytes: &[u8]) -> Result<ObjectSnapshot> {
        codec::from_msgpack(bytes)
    }

    fn adapt_map(&self, attrs: FieldMap) -> Result<FieldMap> {
        attrs
            .into_iter()
            .map(|(name, value)| -> Result<(String, Value)> {
                Ok((name, self.adapters.adapt(value)?))
            })
            .collect()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::PlainObject;

    #[test]
    fn plain_objects_round_trip_through_json() {
        let engine = Engine::new();
        let point = PlainObject::new("Point")
            .with_field("x", 1)
            .with_field("label", "origin");

        let json = engine.encode_json(&point).unwrap();
        let snapshot = engine.decode_json(&json).unwrap();

        let mut restored = PlainObject::new("Point");
        engine.restore_object(&snapshot, &mut restored).unwrap();
        assert_eq!(restored.fields(), point.fields());
    }

    #[test]
    fn restore_rejects_class_mismatch() {
        let engine = Engine::new();
        let snapshot = engine
            .snapshot_object(&PlainObject::new("Point").with_field("x", 1))
            .unwrap();

        let mut other = PlainObject::new("Vector");
        let err = engine.restore_object(&snapshot, &mut other).unwrap_err();
        assert!(matches!(err, AliasError::MalformedSnapshot(_)));
    }

    #[test]
    fn instantiate_requires_factory() {
        let engine = Engine::new();
        let snapshot = engine
            .snapshot_object(&PlainObject::new("Point").with_field("x", 1))
            .unwrap();
        assert!(matches!(
            engine.instantiate(&snapshot),
            Err(AliasError::UnknownClass(_))
        ));

        engine
            .register_factory(
                ClassId::new("Point"),
                Arc::new(|| -> Result<Box<dyn DomainObject>> {
                    Ok(Box::new(PlainObject::new("Point")))
                }),
            )
            .unwrap();
        let restored = engine.instantiate(&snapshot).unwrap();
        assert_eq!(restored.fields().get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn msgpack_keeps_merged_attrs() {
        let engine = Engine::new();
        let point = PlainObject::new("Point").with_field("y", 2.5);

        let bytes = engine.encode_msgpack(&point).unwrap();
        let snapshot = engine.decode_msgpack(&bytes).unwrap();
        assert_eq!(snapshot.merged_attrs().get("y"), Some(&Value::from(2.5)));
    }
}
