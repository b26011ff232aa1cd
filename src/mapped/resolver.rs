use std::sync::Arc;

use super::MappedClassAlias;
use crate::core::Result;
use crate::orm::{DomainObject, MappingDescriptor};

impl MappedClassAlias {
    /// Mapping shared by every instance of this alias's class, or `None` when
    /// the framework does not manage the class.
    ///
    /// Resolved on first use and memoized; a failed lookup other than
    /// "unmanaged" is returned to the caller and retried next time.
    pub fn resolve_mapper(&self, obj: &dyn DomainObject) -> Result<Option<Arc<MappingDescriptor>>> {
        if let Some(mapper) = self.mapper.get() {
            return Ok(mapper.clone());
        }

        let _resolving = self.mapper_init.lock()?;
        if let Some(mapper) = self.mapper.get() {
            return Ok(mapper.clone());
        }

        let mapper = self.descriptors.descriptor_for_instance(obj)?;
        // Only this thread can be here while holding mapper_init
        let _ = self.mapper.set(mapper.clone());
        Ok(mapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AliasConfig;
    use crate::core::ClassId;
    use crate::mapped::MappingDescriptorCache;
    use crate::orm::{MappedClass, MemoryOrm, PlainObject};

    #[test]
    fn mapper_is_memoized_on_the_alias() {
        let orm = Arc::new(MemoryOrm::new());
        orm.map(MappedClass::new("User").primary_key("id")).unwrap();
        let cache = Arc::new(MappingDescriptorCache::new(orm.clone()));
        let alias = MappedClassAlias::new(
            ClassId::new("User"),
            cache,
            Arc::new(AliasConfig::default()),
        );

        let a = orm.blank(&ClassId::new("User")).unwrap();
        let b = orm.blank(&ClassId::new("User")).unwrap();
        let first = alias.resolve_mapper(&a).unwrap().unwrap();
        let second = alias.resolve_mapper(&b).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(orm.introspection_count(), 1);
    }

    #[test]
    fn unmanaged_class_resolves_to_none() {
        let orm = Arc::new(MemoryOrm::new());
        let cache = Arc::new(MappingDescriptorCache::new(orm.clone()));
        let alias = MappedClassAlias::new(
            ClassId::new("Point"),
            cache,
            Arc::new(AliasConfig::default()),
        );

        let point = PlainObject::new("Point");
        assert!(alias.resolve_mapper(&point).unwrap().is_none());
        assert!(alias.resolve_mapper(&point).unwrap().is_none());
        assert_eq!(orm.introspection_count(), 1);
    }
}
