use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    List,
    Dict,
    Set,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Dict => write!(f, "dict"),
            Self::Set => write!(f, "set"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionData {
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

/// Collection proxy the framework installs on relationship attributes.
///
/// Besides the members it carries the owning attribute name, which is
/// framework bookkeeping and must not leak into encoded output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentedCollection {
    kind: CollectionKind,
    owner_attr: Option<String>,
    data: CollectionData,
}

impl InstrumentedCollection {
    pub fn list(owner_attr: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            kind: CollectionKind::List,
            owner_attr: Some(owner_attr.into()),
            data: CollectionData::Sequence(items),
        }
    }

    pub fn dict(owner_attr: impl Into<String>, entries: BTreeMap<String, Value>) -> Self {
        Self {
            kind: CollectionKind::Dict,
            owner_attr: Some(owner_attr.into()),
            data: CollectionData::Mapping(entries),
        }
    }

    pub fn set(owner_attr: impl Into<String>, items: Vec<Value>) -> Self {
        let mut members: Vec<Value> = Vec::new();
        for item in items {
            if !members.contains(&item) {
                members.push(item);
            }
        }
        Self {
            kind: CollectionKind::Set,
            owner_attr: Some(owner_attr.into()),
            data: CollectionData::Sequence(members),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn owner_attr(&self) -> Option<&str> {
        self.owner_attr.as_deref()
    }

    pub fn data(&self) -> &CollectionData {
        &self.data
    }

    pub fn into_data(self) -> CollectionData {
        self.data
    }

    pub fn len(&self) -> usize {
        match &self.data {
            CollectionData::Sequence(items) => items.len(),
            CollectionData::Mapping(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
