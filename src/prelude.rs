//! Common imports for hosts wiring a framework into an engine.

pub use crate::config::AliasConfig;
pub use crate::core::{AliasError, ClassId, FieldMap, Result, Value};
pub use crate::engine::{ClassAlias, Engine, ObjectSnapshot};
pub use crate::mapped::register_mapped_classes;
pub use crate::orm::{ChangeLedger, DomainObject, MappingDescriptor, PersistenceFramework};
