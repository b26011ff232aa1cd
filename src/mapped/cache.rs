use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use log::debug;

use crate::core::{AliasError, ClassId, Result};
use crate::orm::{DomainObject, MappingDescriptor, PersistenceFramework};

/// Class-keyed cache of mapping descriptors shared by every mapped alias of
/// one framework registration.
///
/// Entries are populated once and never invalidated; a class the framework
/// does not map is cached as `None`. Population is serialized so the
/// framework is asked about each class at most once.
pub struct MappingDescriptorCache {
    framework: Arc<dyn PersistenceFramework>,
    entries: RwLock<HashMap<ClassId, Option<Arc<MappingDescriptor>>>>,
    populate: Mutex<()>,
}

impl MappingDescriptorCache {
    pub fn new(framework: Arc<dyn PersistenceFramework>) -> Self {
        Self {
            framework,
            entries: RwLock::new(HashMap::new()),
            populate: Mutex::new(()),
        }
    }

    pub fn framework(&self) -> &Arc<dyn PersistenceFramework> {
        &self.framework
    }

    /// Descriptor of `class`, asking the framework's class lookup on a miss.
    pub fn descriptor_for_class(&self, class: &ClassId) -> Result<Option<Arc<MappingDescriptor>>> {
        self.get_or_populate(class, || self.framework.class_mapper(class))
    }

    /// Descriptor of the instance's class, asking the framework's instance
    /// introspection on a miss.
    pub fn descriptor_for_instance(
        &self,
        instance: &dyn DomainObject,
    ) -> Result<Option<Arc<MappingDescriptor>>> {
        self.get_or_populate(instance.class_id(), || {
            self.framework.object_mapper(instance)
        })
    }

    pub fn is_cached(&self, class: &ClassId) -> Result<bool> {
        Ok(self.entries.read()?.contains_key(class))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn get_or_populate<F>(&self, class: &ClassId, lookup: F) -> Result<Option<Arc<MappingDescriptor>>>
    where
        F: FnOnce() -> Result<Arc<MappingDescriptor>>,
    {
        if let Some(entry) = self.entries.read()?.get(class) {
            return Ok(entry.clone());
        }

        let _populating = self.populate.lock()?;
        if let Some(entry) = self.entries.read()?.get(class) {
            return Ok(entry.clone());
        }

        let entry = match lookup() {
            Ok(descriptor) => Some(descriptor),
            Err(AliasError::UnmanagedType(_)) => None,
            Err(err) => return Err(err),
        };

        debug!(
            "{} mapping for {}: {}",
            self.framework.name(),
            class,
            if entry.is_some() { "mapped" } else { "unmanaged" }
        );
        self.entries.write()?.insert(class.clone(), entry.clone());
        Ok(entry)
    }
}
