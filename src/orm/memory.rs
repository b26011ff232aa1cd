//! In-process persistence framework.
//!
//! Implements the [`PersistenceFramework`] contract over a registry of mapped
//! classes, with entities that track writes the way an ORM unit of work does.
//! Used as the reference host in tests and as a template for adapting real
//! frameworks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use log::debug;

use super::{
    ChangeLedger, DomainObject, MappingDescriptor, PersistenceFramework, PropertyDescriptor,
};
use crate::core::{AliasError, ClassId, FieldMap, Result, Value};

/// Field every entity carries to reach its framework state.
pub const INSTANCE_STATE_ATTR: &str = "_sa_instance_state";

/// Declarative description of a mapped class.
#[derive(Debug, Clone)]
pub struct MappedClass {
    class: ClassId,
    properties: Vec<PropertyDescriptor>,
    primary_key: Vec<String>,
    init_defaults: Vec<(String, Value)>,
}

impl MappedClass {
    pub fn new(class: impl Into<ClassId>) -> Self {
        Self {
            class: class.into(),
            properties: Vec::new(),
            primary_key: Vec::new(),
            init_defaults: Vec::new(),
        }
    }

    pub fn column(mut self, key: &str) -> Self {
        self.properties.push(PropertyDescriptor::column(key));
        self
    }

    /// Declares a primary key column.
    pub fn primary_key(mut self, key: &str) -> Self {
        self.properties.push(PropertyDescriptor::column(key));
        self.primary_key.push(key.to_string());
        self
    }

    pub fn lazy_relationship(mut self, key: &str) -> Self {
        self.properties.push(PropertyDescriptor::relationship(key, true));
        self
    }

    pub fn eager_relationship(mut self, key: &str) -> Self {
        self.properties.push(PropertyDescriptor::relationship(key, false));
        self
    }

    /// Value assigned by the class constructor. Constructor assignments go
    /// through the tracked setter and therefore show up as pending changes.
    pub fn init_default(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.init_defaults.push((key.to_string(), value.into()));
        self
    }
}

struct MappedEntry {
    descriptor: Arc<MappingDescriptor>,
    init_defaults: Vec<(String, Value)>,
}

pub struct MemoryOrm {
    classes: RwLock<HashMap<ClassId, MappedEntry>>,
    introspections: AtomicUsize,
}

impl MemoryOrm {
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
            introspections: AtomicUsize::new(0),
        }
    }

    /// Registers a mapping. Remapping a class is rejected.
    pub fn map(&self, mapped: MappedClass) -> Result<()> {
        let mut classes = self.classes.write()?;
        if classes.contains_key(&mapped.class) {
            return Err(AliasError::FieldAccess(format!(
                "Class '{}' is already mapped",
                mapped.class
            )));
        }

        debug!(
            "mapped class {} with {} properties",
            mapped.class,
            mapped.properties.len()
        );
        let descriptor = MappingDescriptor {
            class: mapped.class.clone(),
            properties: mapped.properties,
            primary_key: mapped.primary_key,
        };
        classes.insert(
            mapped.class,
            MappedEntry {
                descriptor: Arc::new(descriptor),
                init_defaults: mapped.init_defaults,
            },
        );
        Ok(())
    }

    /// Number of `class_mapper`/`object_mapper` lookups served so far.
    pub fn introspection_count(&self) -> usize {
        self.introspections.load(Ordering::SeqCst)
    }

    /// Allocates an instance without running the constructor.
    pub fn blank(&self, class: &ClassId) -> Result<Entity> {
        self.ensure_mapped(class)?;
        Ok(Entity::allocate(class.clone()))
    }

    /// Runs the class constructor: defaults are assigned through the tracked
    /// setter, so the new instance starts out dirty.
    pub fn construct(&self, class: &ClassId) -> Result<Entity> {
        let defaults = {
            let classes = self.classes.read()?;
            let entry = classes
                .get(class)
                .ok_or_else(|| AliasError::UnmanagedType(class.to_string()))?;
            entry.init_defaults.clone()
        };

        let mut entity = Entity::allocate(class.clone());
        for (key, value) in defaults {
            entity.set_attr(&key, value)?;
        }
        Ok(entity)
    }

    /// Builds an instance as if fetched from the backing store. Columns
    /// missing from `row` stay unloaded; nothing is marked modified.
    pub fn load(&self, class: &ClassId, row: FieldMap) -> Result<Entity> {
        self.ensure_mapped(class)?;
        let mut entity = Entity::allocate(class.clone());
        for (key, value) in row {
            entity.populate(&key, value);
        }
        Ok(entity)
    }

    fn ensure_mapped(&self, class: &ClassId) -> Result<()> {
        let classes = self.classes.read()?;
        if classes.contains_key(class) {
            Ok(())
        } else {
            Err(AliasError::UnmanagedType(class.to_string()))
        }
    }
}

impl Default for MemoryOrm {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceFramework for MemoryOrm {
    fn name(&self) -> &str {
        "memory"
    }

    fn class_mapper(&self, class: &ClassId) -> Result<Arc<MappingDescriptor>> {
        self.introspections.fetch_add(1, Ordering::SeqCst);
        let classes = self.classes.read()?;
        classes
            .get(class)
            .map(|entry| entry.descriptor.clone())
            .ok_or_else(|| AliasError::UnmanagedType(class.to_string()))
    }

    fn primary_key_from_instance(
        &self,
        mapping: &MappingDescriptor,
        instance: &dyn DomainObject,
    ) -> Result<Value> {
        let mut parts: Vec<Value> = mapping
            .primary_key
            .iter()
            .map(|key| instance.fields().get(key).cloned().unwrap_or(Value::Null))
            .collect();

        Ok(match parts.len() {
            0 => Value::Null,
            1 => parts.remove(0),
            _ => Value::List(parts),
        })
    }
}

/// Framework-side state of one entity.
///
/// `committed_state` holds the value each modified field had before its first
/// tracked write (`NotLoaded` when it had none). `dict` is the framework's
/// shadow of the loaded field values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceState {
    committed_state: FieldMap,
    dict: FieldMap,
}

impl InstanceState {
    pub fn committed_value(&self, name: &str) -> Option<&Value> {
        self.committed_state.get(name)
    }

    pub fn in_shadow(&self, name: &str) -> bool {
        self.dict.contains_key(name)
    }

    fn record_write(&mut self, name: &str, previous: Option<Value>, value: Value) {
        if !self.committed_state.contains_key(name) {
            self.committed_state
                .insert(name.to_string(), previous.unwrap_or(Value::NotLoaded));
        }
        self.dict.insert(name.to_string(), value);
    }
}

impl ChangeLedger for InstanceState {
    fn is_modified(&self, name: &str) -> bool {
        self.committed_state.contains_key(name)
    }

    fn forget(&mut self, name: &str) {
        self.committed_state.remove(name);
        self.dict.remove(name);
    }

    fn modified_fields(&self) -> Vec<String> {
        self.committed_state.keys().cloned().collect()
    }
}

/// Instance of a class mapped by [`MemoryOrm`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    class: ClassId,
    fields: FieldMap,
    state: InstanceState,
}

impl Entity {
    fn allocate(class: ClassId) -> Self {
        let mut fields = FieldMap::new();
        fields.insert(
            INSTANCE_STATE_ATTR.to_string(),
            Value::Text(format!("<InstanceState {}>", class)),
        );
        Self {
            class,
            fields,
            state: InstanceState::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    pub fn is_dirty(&self) -> bool {
        !self.state.committed_state.is_empty()
    }

    pub fn modified_fields(&self) -> Vec<String> {
        self.state.modified_fields()
    }

    /// Loader path: stores a fetched value without recording a change.
    pub fn populate(&mut self, name: &str, value: Value) {
        self.state.dict.insert(name.to_string(), value.clone());
        self.fields.insert(name.to_string(), value);
    }
}

impl DomainObject for Entity {
    fn class_id(&self) -> &ClassId {
        &self.class
    }

    fn fields(&self) -> &FieldMap {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<()> {
        let previous = self.fields.insert(name.to_string(), value.clone());
        self.state.record_write(name, previous, value);
        Ok(())
    }

    fn change_ledger(&mut self) -> Option<&mut dyn ChangeLedger> {
        Some(&mut self.state)
    }
}

/// Object the framework knows nothing about.
///
/// Records every tracked assignment so callers can tell which path wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainObject {
    class: ClassId,
    fields: FieldMap,
    assignments: Vec<String>,
}

impl PlainObject {
    pub fn new(class: impl Into<ClassId>) -> Self {
        Self {
            class: class.into(),
            fields: FieldMap::new(),
            assignments: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn assignments(&self) -> &[String] {
        &self.assignments
    }
}

impl DomainObject for PlainObject {
    fn class_id(&self) -> &ClassId {
        &self.class
    }

    fn fields(&self) -> &FieldMap {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<()> {
        self.assignments.push(name.to_string());
        self.fields.insert(name.to_string(), value);
        Ok(())
    }
}
