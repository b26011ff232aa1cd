use serde::{Deserialize, Serialize};

use crate::core::{ClassId, FieldMap, Result};

/// Encoded form of one object: its class and both attribute sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub class: ClassId,
    pub static_attrs: FieldMap,
    pub dynamic_attrs: FieldMap,
}

impl ObjectSnapshot {
    /// Both sets merged into the single map handed to `apply_attributes`.
    /// Static entries win over dynamic ones with the same name.
    pub fn merged_attrs(&self) -> FieldMap {
        let mut attrs = self.dynamic_attrs.clone();
        for (name, value) in &self.static_attrs {
            attrs.insert(name.clone(), value.clone());
        }
        attrs
    }
}

pub fn to_json(snapshot: &ObjectSnapshot) -> Result<String> {
    Ok(serde_json::to_string(snapshot)?)
}

pub fn from_json(json: &str) -> Result<ObjectSnapshot> {
    Ok(serde_json::from_str(json)?)
}

pub fn to_msgpack(snapshot: &ObjectSnapshot) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(snapshot)?)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<ObjectSnapshot> {
    Ok(rmp_serde::from_slice(bytes)?)
}
