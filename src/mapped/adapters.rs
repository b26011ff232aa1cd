//! Conversions from the framework's instrumented collections to plain values.

use std::sync::Arc;

use crate::core::{AliasError, Result, Value};
use crate::engine::ValuePredicate;
use crate::orm::{CollectionData, CollectionKind};

pub fn is_instrumented(kind: CollectionKind) -> ValuePredicate {
    Arc::new(move |value: &Value| {
        matches!(value, Value::Instrumented(collection) if collection.kind() == kind)
    })
}

pub fn to_list(value: Value) -> Result<Value> {
    match value {
        Value::Instrumented(collection) => match collection.into_data() {
            CollectionData::Sequence(items) => Ok(Value::List(items)),
            CollectionData::Mapping(entries) => Ok(Value::List(entries.into_values().collect())),
        },
        other => Err(unexpected("list", &other)),
    }
}

pub fn to_dict(value: Value) -> Result<Value> {
    match value {
        Value::Instrumented(collection) => match collection.into_data() {
            CollectionData::Mapping(entries) => Ok(Value::Map(entries)),
            CollectionData::Sequence(_) => Err(AliasError::Codec(
                "instrumented dict without mapping data".to_string(),
            )),
        },
        other => Err(unexpected("dict", &other)),
    }
}

pub fn to_set(value: Value) -> Result<Value> {
    match value {
        Value::Instrumented(collection) => match collection.into_data() {
            CollectionData::Sequence(items) => Ok(Value::set(items)),
            CollectionData::Mapping(entries) => Ok(Value::set(entries.into_values())),
        },
        other => Err(unexpected("set", &other)),
    }
}

fn unexpected(target: &str, value: &Value) -> AliasError {
    AliasError::Codec(format!(
        "cannot convert {} to plain {}",
        value.type_name(),
        target
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::orm::InstrumentedCollection;

    #[test]
    fn instrumented_collections_become_plain() {
        let list = InstrumentedCollection::list("orders", vec![Value::from(1), Value::from(2)]);
        assert_eq!(
            to_list(Value::Instrumented(list)).unwrap(),
            Value::list([1i64, 2])
        );

        let mut entries = BTreeMap::new();
        entries.insert("home".to_string(), Value::from("a st"));
        let dict = InstrumentedCollection::dict("addresses", entries.clone());
        assert_eq!(to_dict(Value::Instrumented(dict)).unwrap(), Value::Map(entries));

        let set = InstrumentedCollection::set("tags", vec![Value::from("a"), Value::from("a")]);
        assert_eq!(
            to_set(Value::Instrumented(set)).unwrap(),
            Value::set(vec![Value::from("a")])
        );
    }

    #[test]
    fn predicates_match_by_kind() {
        let list = Value::Instrumented(InstrumentedCollection::list("orders", vec![]));
        assert!(is_instrumented(CollectionKind::List)(&list));
        assert!(!is_instrumented(CollectionKind::Set)(&list));
        assert!(!is_instrumented(CollectionKind::List)(&Value::List(vec![])));
    }

    #[test]
    fn plain_values_are_rejected() {
        assert!(to_list(Value::from(1)).is_err());
        assert!(to_dict(Value::List(vec![])).is_err());
    }
}
