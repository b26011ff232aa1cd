use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::orm::collections::InstrumentedCollection;

/// A field value as exchanged between host objects and the engine.
///
/// `NotLoaded` marks a declared field that was never fetched from the backing
/// store. It is a variant of its own and never compares equal to `Null`, an
/// empty collection or any text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    NotLoaded,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Set(Vec<Value>),
    /// Framework collection proxy. Converted by a type adapter before encoding.
    Instrumented(InstrumentedCollection),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::NotLoaded => "NOT_LOADED",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Uuid(_) => "UUID",
            Self::List(_) => "LIST",
            Self::Map(_) => "MAP",
            Self::Set(_) => "SET",
            Self::Instrumented(_) => "INSTRUMENTED",
        }
    }

    /// Builds a set value, keeping the first occurrence of each member.
    pub fn set<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut members: Vec<Value> = Vec::new();
        for item in items {
            if !members.contains(&item) {
                members.push(item);
            }
        }
        Self::Set(members)
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_not_loaded(&self) -> bool {
        matches!(self, Self::NotLoaded)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the text members of a list, or `None` if any member is not text.
    pub fn as_text_list(&self) -> Option<Vec<String>> {
        self.as_list()?
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::NotLoaded, Self::NotLoaded) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_bits(*a) == float_bits(*b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            // Sets compare without regard to member order
            (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Self::Instrumented(a), Self::Instrumented(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Bit pattern used for float equality and hashing: all NaNs are one value
/// and `-0.0` equals `0.0`.
fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::NotLoaded => 1u8.hash(state),
            Self::Boolean(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Self::Integer(i) => {
                3u8.hash(state);
                i.hash(state);
            }
            Self::Float(f) => {
                4u8.hash(state);
                float_bits(*f).hash(state);
            }
            Self::Text(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Self::Timestamp(t) => {
                6u8.hash(state);
                t.hash(state);
            }
            Self::Uuid(u) => {
                7u8.hash(state);
                u.hash(state);
            }
            Self::List(items) => {
                8u8.hash(state);
                items.hash(state);
            }
            Self::Map(entries) => {
                9u8.hash(state);
                entries.hash(state);
            }
            Self::Set(items) => {
                10u8.hash(state);
                items.len().hash(state);
            }
            Self::Instrumented(collection) => {
                11u8.hash(state);
                collection.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::NotLoaded => write!(f, "<not loaded>"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::List(items) | Self::Set(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Self::Map(entries) => {
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Self::Instrumented(collection) => write!(f, "<instrumented {}>", collection.kind()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<InstrumentedCollection> for Value {
    fn from(collection: InstrumentedCollection) -> Self {
        Self::Instrumented(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_loaded_is_distinct_from_null_like_values() {
        assert_ne!(Value::NotLoaded, Value::Null);
        assert_ne!(Value::NotLoaded, Value::List(vec![]));
        assert_ne!(Value::NotLoaded, Value::from("NotLoaded"));
        assert!(Value::NotLoaded.is_not_loaded());
        assert!(!Value::Null.is_not_loaded());
    }

    #[test]
    fn not_loaded_survives_json_and_msgpack() {
        let json = serde_json::to_string(&Value::NotLoaded).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::NotLoaded);

        let text_json = serde_json::to_string(&Value::from("NotLoaded")).unwrap();
        let text_back: Value = serde_json::from_str(&text_json).unwrap();
        assert_eq!(text_back, Value::from("NotLoaded"));

        let packed = rmp_serde::to_vec(&Value::NotLoaded).unwrap();
        let unpacked: Value = rmp_serde::from_slice(&packed).unwrap();
        assert_eq!(unpacked, Value::NotLoaded);
    }

    #[test]
    fn set_deduplicates_and_ignores_order() {
        let a = Value::set(vec![Value::from(1), Value::from(2), Value::from(1)]);
        let b = Value::set(vec![Value::from(2), Value::from(1)]);
        assert_eq!(a, b);
        match a {
            Value::Set(items) => assert_eq!(items.len(), 2),
            other => panic!("expected set, got {}", other.type_name()),
        }
    }

    #[test]
    fn equal_floats_hash_alike() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(value: &Value) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let pairs = [
            (Value::Float(0.0), Value::Float(-0.0)),
            (Value::Float(f64::NAN), Value::Float(-f64::NAN)),
            (Value::Float(0.1 + 0.2), Value::Float(0.1 + 0.2)),
        ];
        for (a, b) in &pairs {
            assert_eq!(a, b);
            assert_eq!(hash_of(a), hash_of(b));
        }
        assert_ne!(Value::Float(1.0), Value::Float(1.0 + f64::EPSILON));
    }

    #[test]
    fn text_list_extraction() {
        let names = Value::list(["orders", "tags"]);
        assert_eq!(
            names.as_text_list(),
            Some(vec!["orders".to_string(), "tags".to_string()])
        );
        assert_eq!(Value::list([1i64, 2]).as_text_list(), None);
    }
}
