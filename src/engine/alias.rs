use crate::core::{AttributeSets, ClassId, FieldMap, Result, Value};
use crate::orm::DomainObject;

/// Per-class strategy the engine uses to read and write object attributes.
///
/// One alias instance serves every object of its class, so implementations
/// may memoize class-level facts on `self`.
pub trait ClassAlias: Send + Sync {
    fn class_id(&self) -> &ClassId;

    /// Names of the static and dynamic attributes of `obj`.
    fn get_attrs(&self, obj: &dyn DomainObject) -> Result<(Vec<String>, Vec<String>)>;

    /// Static and dynamic attribute values of `obj`.
    fn get_attributes(&self, obj: &dyn DomainObject) -> Result<AttributeSets>;

    /// Writes decoded attributes onto `obj`.
    fn apply_attributes(&self, obj: &mut dyn DomainObject, attrs: FieldMap) -> Result<()>;
}

/// Strategy used for every class no registered predicate claims.
///
/// Static names come from configuration; every other own field is dynamic.
/// Decoded attributes are written through the tracked `set_attr` path, the
/// same as ordinary assignments.
#[derive(Debug, Clone)]
pub struct DefaultAlias {
    class: ClassId,
    static_attrs: Vec<String>,
}

impl DefaultAlias {
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            static_attrs: Vec::new(),
        }
    }

    pub fn with_static_attrs(class: ClassId, static_attrs: Vec<String>) -> Self {
        Self {
            class,
            static_attrs,
        }
    }
}

impl ClassAlias for DefaultAlias {
    fn class_id(&self) -> &ClassId {
        &self.class
    }

    fn get_attrs(&self, obj: &dyn DomainObject) -> Result<(Vec<String>, Vec<String>)> {
        let dynamic_attrs = obj
            .fields()
            .keys()
            .filter(|key| !self.static_attrs.contains(key))
            .cloned()
            .collect();

        Ok((self.static_attrs.clone(), dynamic_attrs))
    }

    fn get_attributes(&self, obj: &dyn DomainObject) -> Result<AttributeSets> {
        let (static_names, dynamic_names) = self.get_attrs(obj)?;

        let static_attrs = static_names
            .into_iter()
            .map(|name| {
                let value = obj.fields().get(&name).cloned().unwrap_or(Value::Null);
                (name, value)
            })
            .collect();

        let dynamic_attrs = dynamic_names
            .into_iter()
            .filter_map(|name| obj.fields().get(&name).cloned().map(|value| (name, value)))
            .collect();

        Ok((static_attrs, dynamic_attrs))
    }

    fn apply_attributes(&self, obj: &mut dyn DomainObject, attrs: FieldMap) -> Result<()> {
        for (name, value) in attrs {
            obj.set_attr(&name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::PlainObject;

    #[test]
    fn every_field_is_dynamic_by_default() {
        let alias = DefaultAlias::new(ClassId::new("Point"));
        let point = PlainObject::new("Point")
            .with_field("x", 1)
            .with_field("y", 2);

        let (static_names, dynamic_names) = alias.get_attrs(&point).unwrap();
        assert!(static_names.is_empty());
        assert_eq!(dynamic_names, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn configured_static_attrs_default_to_null() {
        let alias =
            DefaultAlias::with_static_attrs(ClassId::new("Point"), vec!["z".to_string()]);
        let point = PlainObject::new("Point").with_field("x", 1);

        let (static_attrs, dynamic_attrs) = alias.get_attributes(&point).unwrap();
        assert_eq!(static_attrs.get("z"), Some(&Value::Null));
        assert_eq!(dynamic_attrs.get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn apply_goes_through_tracked_setter() {
        let alias = DefaultAlias::new(ClassId::new("Point"));
        let mut point = PlainObject::new("Point");
        let mut attrs = FieldMap::new();
        attrs.insert("x".into(), Value::from(5));

        alias.apply_attributes(&mut point, attrs).unwrap();
        assert_eq!(point.get("x"), Some(&Value::from(5)));
        assert_eq!(point.assignments(), ["x".to_string()]);
    }
}
