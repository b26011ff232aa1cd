use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use super::alias::{ClassAlias, DefaultAlias};
use crate::core::{AliasError, ClassId, Result, Value};

pub type AliasPredicate = Arc<dyn Fn(&ClassId) -> Result<bool> + Send + Sync>;
pub type AliasFactory = Arc<dyn Fn(&ClassId) -> Arc<dyn ClassAlias> + Send + Sync>;
pub type ValuePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type ValueConverter = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

struct AliasStrategy {
    name: String,
    predicate: AliasPredicate,
    factory: AliasFactory,
}

/// Type → strategy table.
///
/// Strategies are consulted in registration order and the first predicate
/// that accepts a class wins; unclaimed classes get a [`DefaultAlias`]. The
/// alias chosen for a class is built once and shared afterwards.
pub struct AliasRegistry {
    strategies: RwLock<Vec<AliasStrategy>>,
    aliases: RwLock<HashMap<ClassId, Arc<dyn ClassAlias>>>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self {
            strategies: RwLock::new(Vec::new()),
            aliases: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_alias_type(
        &self,
        name: &str,
        predicate: AliasPredicate,
        factory: AliasFactory,
    ) -> Result<()> {
        debug!("registered alias strategy: {}", name);
        self.strategies.write()?.push(AliasStrategy {
            name: name.to_string(),
            predicate,
            factory,
        });
        Ok(())
    }

    pub fn strategy_names(&self) -> Result<Vec<String>> {
        Ok(self
            .strategies
            .read()?
            .iter()
            .map(|strategy| strategy.name.clone())
            .collect())
    }

    /// Alias for `class`, created on first request.
    pub fn alias_for(&self, class: &ClassId) -> Result<Arc<dyn ClassAlias>> {
        if let Some(alias) = self.aliases.read()?.get(class) {
            return Ok(alias.clone());
        }

        let mut aliases = self.aliases.write()?;
        // Another caller may have won the race for the write lock
        if let Some(alias) = aliases.get(class) {
            return Ok(alias.clone());
        }

        let alias = self.select(class)?;
        aliases.insert(class.clone(), alias.clone());
        Ok(alias)
    }

    fn select(&self, class: &ClassId) -> Result<Arc<dyn ClassAlias>> {
        let strategies = self.strategies.read()?;
        for strategy in strategies.iter() {
            if (strategy.predicate)(class)? {
                debug!("class {} handled by {}", class, strategy.name);
                return Ok((strategy.factory)(class));
            }
        }
        Ok(Arc::new(DefaultAlias::new(class.clone())))
    }
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct TypeAdapter {
    name: String,
    predicate: ValuePredicate,
    convert: ValueConverter,
}

/// Value conversions applied before encoding, e.g. framework collection
/// proxies into plain collections. First matching adapter wins.
pub struct TypeAdapterRegistry {
    adapters: RwLock<Vec<TypeAdapter>>,
}

impl TypeAdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(Vec::new()),
        }
    }

    pub fn add_type(
        &self,
        name: &str,
        predicate: ValuePredicate,
        convert: ValueConverter,
    ) -> Result<()> {
        debug!("registered type adapter: {}", name);
        self.adapters.write()?.push(TypeAdapter {
            name: name.to_string(),
            predicate,
            convert,
        });
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.adapters.read()?.len())
    }

    /// Converts `value` and everything nested in it.
    ///
    /// Instrumented values no adapter claims are rejected rather than
    /// encoded with their framework bookkeeping.
    pub fn adapt(&self, value: Value) -> Result<Value> {
        let value = self.convert_one(value)?;

        match value {
            Value::List(items) => Ok(Value::List(self.adapt_all(items)?)),
            Value::Set(items) => Ok(Value::set(self.adapt_all(items)?)),
            Value::Map(entries) => {
                let mut adapted = std::collections::BTreeMap::new();
                for (key, item) in entries {
                    adapted.insert(key, self.adapt(item)?);
                }
                Ok(Value::Map(adapted))
            }
            Value::Instrumented(collection) => Err(AliasError::Codec(format!(
                "no type adapter for instrumented {}",
                collection.kind()
            ))),
            other => Ok(other),
        }
    }

    fn adapt_all(&self, items: Vec<Value>) -> Result<Vec<Value>> {
        items.into_iter().map(|item| self.adapt(item)).collect()
    }

    fn convert_one(&self, value: Value) -> Result<Value> {
        let adapters = self.adapters.read()?;
        match adapters.iter().find(|adapter| (adapter.predicate)(&value)) {
            Some(adapter) => {
                let converted = (adapter.convert)(value).map_err(|err| {
                    AliasError::Codec(format!("type adapter {} failed: {}", adapter.name, err))
                })?;
                Ok(converted)
            }
            None => Ok(value),
        }
    }
}

impl Default for TypeAdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
