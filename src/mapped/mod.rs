//! Serialization strategy for classes mapped by a persistence framework.
//!
//! [`MappedClassAlias`] reports every declared property as a static
//! attribute, marks lazy properties that were never fetched with
//! [`Value::NotLoaded`], and on decode writes through the raw field store so
//! the framework sees a freshly loaded instance instead of pending changes.

use std::sync::{Arc, Mutex, OnceLock};

use log::debug;

use crate::config::AliasConfig;
use crate::core::{AttributeSets, ClassId, FieldMap, Result, Value};
use crate::engine::{ClassAlias, DefaultAlias, Engine};
use crate::orm::{CollectionKind, DomainObject, MappingDescriptor, PersistenceFramework};

pub mod adapters;
pub mod cache;
mod classify;
mod reconstitute;
mod resolver;
mod snapshot;

pub use cache::MappingDescriptorCache;

/// Name the mapped-class strategy is registered under.
pub const MAPPED_STRATEGY: &str = "mapped-class";

pub struct MappedClassAlias {
    class: ClassId,
    framework: Arc<dyn PersistenceFramework>,
    descriptors: Arc<MappingDescriptorCache>,
    config: Arc<AliasConfig>,
    fallback: DefaultAlias,
    mapper: OnceLock<Option<Arc<MappingDescriptor>>>,
    mapper_init: Mutex<()>,
    static_attrs: OnceLock<Vec<String>>,
    lazy_attrs: OnceLock<Vec<String>>,
}

impl MappedClassAlias {
    pub fn new(
        class: ClassId,
        descriptors: Arc<MappingDescriptorCache>,
        config: Arc<AliasConfig>,
    ) -> Self {
        Self {
            fallback: DefaultAlias::new(class.clone()),
            class,
            framework: descriptors.framework().clone(),
            descriptors,
            config,
            mapper: OnceLock::new(),
            mapper_init: Mutex::new(()),
            static_attrs: OnceLock::new(),
            lazy_attrs: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &AliasConfig {
        &self.config
    }
}

impl ClassAlias for MappedClassAlias {
    fn class_id(&self) -> &ClassId {
        &self.class
    }

    fn get_attrs(&self, obj: &dyn DomainObject) -> Result<(Vec<String>, Vec<String>)> {
        self.classify(obj)
    }

    fn get_attributes(&self, obj: &dyn DomainObject) -> Result<AttributeSets> {
        self.snapshot(obj)
    }

    fn apply_attributes(&self, obj: &mut dyn DomainObject, attrs: FieldMap) -> Result<()> {
        self.reconstitute(obj, attrs)
    }
}

/// Installs the mapped-class strategy and the instrumented collection
/// adapters on `engine`.
///
/// Returns the descriptor cache shared by every alias the strategy creates.
pub fn register_mapped_classes(
    engine: &Engine,
    framework: Arc<dyn PersistenceFramework>,
    config: AliasConfig,
) -> Result<Arc<MappingDescriptorCache>> {
    let descriptors = Arc::new(MappingDescriptorCache::new(framework));
    let config = Arc::new(config);

    let lookup = descriptors.clone();
    let shared = descriptors.clone();
    engine.register_alias_type(
        MAPPED_STRATEGY,
        Arc::new(move |class: &ClassId| -> Result<bool> {
            Ok(lookup.descriptor_for_class(class)?.is_some())
        }),
        Arc::new(move |class: &ClassId| -> Arc<dyn ClassAlias> {
            Arc::new(MappedClassAlias::new(
                class.clone(),
                shared.clone(),
                config.clone(),
            ))
        }),
    )?;

    engine.add_type(
        "instrumented-list",
        adapters::is_instrumented(CollectionKind::List),
        Arc::new(adapters::to_list),
    )?;
    engine.add_type(
        "instrumented-dict",
        adapters::is_instrumented(CollectionKind::Dict),
        Arc::new(adapters::to_dict),
    )?;
    engine.add_type(
        "instrumented-set",
        adapters::is_instrumented(CollectionKind::Set),
        Arc::new(adapters::to_set),
    )?;

    debug!(
        "mapped-class strategy installed for framework {}",
        descriptors.framework().name()
    );
    Ok(descriptors)
}

fn is_loaded(obj: &dyn DomainObject, name: &str) -> bool {
    matches!(obj.fields().get(name), Some(value) if !value.is_not_loaded())
}

fn text_list(names: &[String]) -> Value {
    Value::List(names.iter().cloned().map(Value::Text).collect())
}
