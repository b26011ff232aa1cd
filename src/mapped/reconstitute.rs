use log::warn;

use super::MappedClassAlias;
use crate::core::{AliasError, FieldMap, Result, Value};
use crate::engine::ClassAlias;
use crate::orm::{DomainObject, MappingDescriptor};

impl MappedClassAlias {
    /// Writes decoded attributes onto `obj` without leaving change-tracking
    /// traces.
    ///
    /// Lazy properties listed under the lazy attribute, and declared
    /// properties that arrive as [`Value::NotLoaded`], are removed from the
    /// instance and forgotten by the framework, whatever value the instance
    /// held for them. Everything else is assigned through the raw field store.
    /// The snapshot is validated before `obj` is touched.
    pub fn reconstitute(&self, obj: &mut dyn DomainObject, mut attrs: FieldMap) -> Result<()> {
        let Some(mapping) = self.resolve_mapper(obj)? else {
            return self.fallback.apply_attributes(obj, attrs);
        };

        let lazy_listed = match attrs.remove(&self.config.lazy_attr) {
            Some(listed) => Some(self.parse_lazy_list(&mapping, listed)?),
            None => None,
        };
        attrs.remove(&self.config.key_attr);
        let mut unloaded = self.check_not_loaded_markers(&mapping, &mut attrs)?;
        for name in lazy_listed.unwrap_or_default() {
            if !unloaded.contains(&name) {
                unloaded.push(name);
            }
        }

        for name in &unloaded {
            obj.fields_mut().remove(name);
            if let Some(ledger) = obj.change_ledger() {
                ledger.forget(name);
            }
            attrs.remove(name);
        }

        for (name, value) in attrs {
            if self.config.is_excluded(&name) {
                warn!("{}: ignoring framework-internal attribute {}", self.class, name);
                continue;
            }
            obj.fields_mut().insert(name, value);
        }

        Ok(())
    }

    fn parse_lazy_list(&self, mapping: &MappingDescriptor, listed: Value) -> Result<Vec<String>> {
        let Some(names) = listed.as_text_list() else {
            return self.malformed(format!(
                "'{}' must be a list of names, got {}",
                self.config.lazy_attr,
                listed.type_name()
            ));
        };

        let mut accepted = Vec::with_capacity(names.len());
        for name in names {
            if mapping.property(&name).is_some_and(|prop| prop.is_lazy()) {
                accepted.push(name);
                continue;
            }

            if self.config.strict_snapshots {
                return Err(AliasError::MalformedSnapshot(format!(
                    "'{}' lists '{}', which {} does not declare lazy",
                    self.config.lazy_attr, name, self.class
                )));
            }
            warn!("{}: '{}' is not a lazy property, skipped", self.class, name);
        }

        Ok(accepted)
    }

    /// Returns the declared properties that arrived as not loaded. The marker
    /// on any other name would be assigned as data, so it is rejected.
    fn check_not_loaded_markers(
        &self,
        mapping: &MappingDescriptor,
        attrs: &mut FieldMap,
    ) -> Result<Vec<String>> {
        let (declared, stray): (Vec<String>, Vec<String>) = attrs
            .iter()
            .filter(|(_, value)| value.is_not_loaded())
            .map(|(name, _)| name.clone())
            .partition(|name| mapping.declares(name));

        for name in stray {
            if self.config.strict_snapshots {
                return Err(AliasError::MalformedSnapshot(format!(
                    "'{}' is marked not loaded but {} does not declare it",
                    name, self.class
                )));
            }
            warn!("{}: dropping not-loaded marker for '{}'", self.class, name);
            attrs.remove(&name);
        }

        Ok(declared)
    }

    /// Lenient mode treats an unreadable lazy list as absent.
    fn malformed(&self, message: String) -> Result<Vec<String>> {
        if self.config.strict_snapshots {
            return Err(AliasError::MalformedSnapshot(message));
        }
        warn!("{}: {}", self.class, message);
        Ok(Vec::new())
    }
}
