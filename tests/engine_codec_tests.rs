use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ormalias::orm::{Entity, InstrumentedCollection, MappedClass, MemoryOrm};
use ormalias::{
    AliasConfig, AliasError, ClassId, DomainObject, MAPPED_STRATEGY, Value,
    engine_for,
};
use uuid::Uuid;

fn order_orm() -> anyhow::Result<Arc<MemoryOrm>> {
    let orm = Arc::new(MemoryOrm::new());
    orm.map(
        MappedClass::new("Order")
            .primary_key("id")
            .column("placed_at")
            .column("customer")
            .lazy_relationship("lines")
            .lazy_relationship("labels")
            .eager_relationship("addresses"),
    )?;
    Ok(orm)
}

fn order(orm: &MemoryOrm) -> anyhow::Result<Entity> {
    let mut order = orm.blank(&ClassId::new("Order"))?;
    order.populate("id", Value::Uuid(Uuid::nil()));
    order.populate(
        "placed_at",
        Value::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
    );
    order.populate("customer", Value::Null);

    let mut addresses = BTreeMap::new();
    addresses.insert("billing".to_string(), Value::from("1 Main St"));
    order.populate(
        "addresses",
        Value::Instrumented(InstrumentedCollection::dict("addresses", addresses)),
    );
    order.populate(
        "labels",
        Value::Instrumented(InstrumentedCollection::set(
            "labels",
            vec![Value::from("gift"), Value::from("rush")],
        )),
    );
    Ok(order)
}

#[test]
fn json_round_trip_keeps_marker_and_null_apart() -> anyhow::Result<()> {
    let orm = order_orm()?;
    let engine = engine_for(orm.clone(), AliasConfig::default())?;

    let json = engine.encode_json(&order(&orm)?)?;
    let snapshot = engine.decode_json(&json)?;

    assert_eq!(snapshot.static_attrs["customer"], Value::Null);
    assert_eq!(snapshot.static_attrs["lines"], Value::NotLoaded);
    assert_eq!(snapshot.static_attrs["sa_lazy"], Value::list(["lines"]));
    assert_eq!(
        snapshot.static_attrs["labels"],
        Value::set(vec![Value::from("rush"), Value::from("gift")])
    );
    assert!(matches!(snapshot.static_attrs["addresses"], Value::Map(_)));

    let mut blank = orm.blank(&ClassId::new("Order"))?;
    engine.restore_object(&snapshot, &mut blank)?;
    assert_eq!(blank.get("customer"), Some(&Value::Null));
    assert!(!blank.has_field("lines"));
    assert!(!blank.is_dirty());
    Ok(())
}

#[test]
fn msgpack_round_trip_through_factory() -> anyhow::Result<()> {
    let orm = order_orm()?;
    let engine = engine_for(orm.clone(), AliasConfig::default())?;
    let factory_orm = orm.clone();
    engine.register_factory(
        ClassId::new("Order"),
        Arc::new(move || -> ormalias::Result<Box<dyn DomainObject>> {
            Ok(Box::new(factory_orm.construct(&ClassId::new("Order"))?))
        }),
    )?;

    let source = order(&orm)?;
    let bytes = engine.encode_msgpack(&source)?;
    let snapshot = engine.decode_msgpack(&bytes)?;
    let mut restored = engine.instantiate(&snapshot)?;

    assert_eq!(restored.fields().get("id"), Some(&Value::Uuid(Uuid::nil())));
    assert_eq!(
        restored.fields().get("placed_at"),
        source.get("placed_at")
    );
    assert!(!restored.has_field("lines"));
    let ledger = restored
        .change_ledger()
        .ok_or_else(|| anyhow::anyhow!("entity without ledger"))?;
    assert!(ledger.modified_fields().is_empty());
    Ok(())
}

#[test]
fn strategy_and_adapters_are_registered() -> anyhow::Result<()> {
    let orm = order_orm()?;
    let engine = engine_for(orm, AliasConfig::default())?;

    assert_eq!(engine.aliases().strategy_names()?, vec![MAPPED_STRATEGY.to_string()]);
    assert_eq!(engine.adapters().len()?, 3);
    Ok(())
}

#[test]
fn unknown_class_cannot_be_instantiated() -> anyhow::Result<()> {
    let orm = order_orm()?;
    let engine = engine_for(orm.clone(), AliasConfig::default())?;
    let snapshot = engine.snapshot_object(&order(&orm)?)?;

    match engine.instantiate(&snapshot) {
        Err(AliasError::UnknownClass(class)) => assert_eq!(class, "Order"),
        Err(other) => anyhow::bail!("unexpected error: {other}"),
        Ok(_) => anyhow::bail!("instantiated without a factory"),
    }
    Ok(())
}
