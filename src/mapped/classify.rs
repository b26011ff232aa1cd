use super::MappedClassAlias;
use crate::core::Result;
use crate::engine::ClassAlias;
use crate::orm::{DomainObject, MappingDescriptor};

impl MappedClassAlias {
    /// Reserved names followed by every declared property, in declaration
    /// order. Computed once per class.
    pub(crate) fn static_attr_names(&self, mapping: &MappingDescriptor) -> &[String] {
        self.static_attrs.get_or_init(|| {
            let mut names = vec![self.config.key_attr.clone(), self.config.lazy_attr.clone()];
            names.extend(mapping.iterate_properties().map(|prop| prop.key.clone()));
            names
        })
    }

    /// Splits the attribute names of `obj` into static and dynamic ones.
    pub fn classify(&self, obj: &dyn DomainObject) -> Result<(Vec<String>, Vec<String>)> {
        let Some(mapping) = self.resolve_mapper(obj)? else {
            return self.fallback.get_attrs(obj);
        };

        let static_attrs = self.static_attr_names(&mapping).to_vec();
        let dynamic_attrs = obj
            .fields()
            .keys()
            .filter(|key| !self.config.is_excluded(key))
            .filter(|key| !static_attrs.contains(key))
            .cloned()
            .collect();

        Ok((static_attrs, dynamic_attrs))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AliasConfig;
    use crate::core::{ClassId, Value};
    use crate::engine::ClassAlias;
    use crate::mapped::MappingDescriptorCache;
    use crate::orm::{MappedClass, MemoryOrm, PlainObject};

    fn alias_for(orm: &Arc<MemoryOrm>, class: &str, config: AliasConfig) -> MappedClassAlias {
        MappedClassAlias::new(
            ClassId::new(class),
            Arc::new(MappingDescriptorCache::new(orm.clone())),
            Arc::new(config),
        )
    }

    #[test]
    fn declared_properties_are_static_in_order() {
        let orm = Arc::new(MemoryOrm::new());
        orm.map(
            MappedClass::new("User")
                .primary_key("id")
                .column("name")
                .lazy_relationship("orders"),
        )
        .unwrap();
        let alias = alias_for(&orm, "User", AliasConfig::default());

        let mut user = orm.blank(&ClassId::new("User")).unwrap();
        user.populate("name", Value::from("a"));
        user.populate("note", Value::from("x"));
        user.populate("_sa_session_id", Value::from(3));

        let (static_attrs, dynamic_attrs) = alias.get_attrs(&user).unwrap();
        assert_eq!(static_attrs, vec!["sa_key", "sa_lazy", "id", "name", "orders"]);
        assert_eq!(dynamic_attrs, vec!["note".to_string()]);
    }

    #[test]
    fn extra_exclusions_apply_to_dynamic_names() {
        let orm = Arc::new(MemoryOrm::new());
        orm.map(MappedClass::new("User").primary_key("id")).unwrap();
        let alias = alias_for(&orm, "User", AliasConfig::new().exclude("_cache"));

        let mut user = orm.blank(&ClassId::new("User")).unwrap();
        user.populate("_cache", Value::Null);
        user.populate("tag", Value::from("t"));

        let (_, dynamic_attrs) = alias.classify(&user).unwrap();
        assert_eq!(dynamic_attrs, vec!["tag".to_string()]);
    }

    #[test]
    fn unmanaged_objects_use_generic_classification() {
        let orm = Arc::new(MemoryOrm::new());
        let alias = alias_for(&orm, "Point", AliasConfig::default());
        let point = PlainObject::new("Point")
            .with_field("x", 1)
            .with_field("_sa_instance_state", "kept");

        let (static_attrs, dynamic_attrs) = alias.classify(&point).unwrap();
        assert!(static_attrs.is_empty());
        assert_eq!(dynamic_attrs, vec!["_sa_instance_state".to_string(), "x".to_string()]);
    }
}
