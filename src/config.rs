use std::collections::HashSet;

use lazy_static::lazy_static;

pub const DEFAULT_KEY_ATTR: &str = "sa_key";
pub const DEFAULT_LAZY_ATTR: &str = "sa_lazy";

lazy_static! {
    /// Framework bookkeeping that lives on instances but is never part of
    /// their serialized state.
    pub static ref FRAMEWORK_INTERNAL_ATTRS: HashSet<&'static str> = [
        "_sa_instance_state",
        "_sa_session_id",
        "_state",
        "_entity_name",
        "_instance_key",
        "_sa_class_manager",
        "_sa_adapter",
        "_sa_appender",
        "_sa_instrumented",
        "_sa_iterator",
        "_sa_remover",
        "_sa_initiator",
    ]
    .into_iter()
    .collect();
}

/// Settings of the mapped-class strategy
#[derive(Debug, Clone)]
pub struct AliasConfig {
    /// Reserved static attribute carrying the primary key
    pub key_attr: String,

    /// Reserved static attribute listing unloaded lazy properties
    pub lazy_attr: String,

    /// Names excluded in addition to [`FRAMEWORK_INTERNAL_ATTRS`]
    pub extra_excluded_attrs: Vec<String>,

    /// Reject malformed snapshots instead of skipping the offending entries
    pub strict_snapshots: bool,
}

impl AliasConfig {
    pub fn new() -> Self {
        Self {
            key_attr: DEFAULT_KEY_ATTR.to_string(),
            lazy_attr: DEFAULT_LAZY_ATTR.to_string(),
            extra_excluded_attrs: Vec::new(),
            strict_snapshots: true,
        }
    }

    /// Set the reserved key attribute name
    pub fn key_attr(mut self, name: &str) -> Self {
        self.key_attr = name.to_string();
        self
    }

    /// Set the reserved lazy list attribute name
    pub fn lazy_attr(mut self, name: &str) -> Self {
        self.lazy_attr = name.to_string();
        self
    }

    /// Exclude one more field name from snapshots
    pub fn exclude(mut self, name: &str) -> Self {
        self.extra_excluded_attrs.push(name.to_string());
        self
    }

    pub fn strict_snapshots(mut self, strict: bool) -> Self {
        self.strict_snapshots = strict;
        self
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        FRAMEWORK_INTERNAL_ATTRS.contains(name)
            || self.extra_excluded_attrs.iter().any(|extra| extra == name)
    }

    /// Is `name` one of the two synthetic static attributes?
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.key_attr || name == self.lazy_attr
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self::new()
    }
}
