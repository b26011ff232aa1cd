use super::{MappedClassAlias, is_loaded, text_list};
use crate::core::{AttributeSets, FieldMap, Result, Value};
use crate::engine::ClassAlias;
use crate::orm::{DomainObject, MappingDescriptor};

impl MappedClassAlias {
    /// Properties the mapping declares lazy. A property of the class, not of
    /// any instance, so computed once.
    pub(crate) fn lazy_attr_names(&self, mapping: &MappingDescriptor) -> &[String] {
        self.lazy_attrs.get_or_init(|| {
            mapping
                .lazy_properties()
                .map(|prop| prop.key.clone())
                .collect()
        })
    }

    /// Lazy properties of `obj` that have not been fetched.
    pub fn unloaded_lazy_attrs(&self, obj: &dyn DomainObject) -> Result<Vec<String>> {
        let Some(mapping) = self.resolve_mapper(obj)? else {
            return Ok(Vec::new());
        };

        Ok(self
            .lazy_attr_names(&mapping)
            .iter()
            .filter(|name| !is_loaded(obj, name))
            .cloned()
            .collect())
    }

    /// Static and dynamic attribute values of `obj`.
    ///
    /// Every declared property is present in the static set, as
    /// [`Value::NotLoaded`] when it was never fetched. Reading never touches
    /// the backing store.
    pub fn snapshot(&self, obj: &dyn DomainObject) -> Result<AttributeSets> {
        let Some(mapping) = self.resolve_mapper(obj)? else {
            return self.fallback.get_attributes(obj);
        };

        let (static_names, dynamic_names) = self.classify(obj)?;
        let mut static_attrs = FieldMap::new();
        let mut dynamic_attrs = FieldMap::new();

        for name in static_names {
            if is_loaded(obj, &name) {
                let value = obj.fields().get(&name).cloned().unwrap_or(Value::Null);
                static_attrs.insert(name, value);
                continue;
            }

            if self.config.is_reserved(&name) {
                continue;
            }

            static_attrs.insert(name, Value::NotLoaded);
        }

        for name in dynamic_names {
            if let Some(value) = obj.fields().get(&name) {
                dynamic_attrs.insert(name, value.clone());
            }
        }

        let key = self.framework.primary_key_from_instance(&mapping, obj)?;
        let unloaded = self.unloaded_lazy_attrs(obj)?;
        static_attrs.insert(self.config.key_attr.clone(), key);
        static_attrs.insert(self.config.lazy_attr.clone(), text_list(&unloaded));

        Ok((static_attrs, dynamic_attrs))
    }
}
