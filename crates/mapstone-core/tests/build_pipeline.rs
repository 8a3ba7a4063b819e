//! Cross-unit build pipeline: deferred resolution, cache sharing, and the
//! executor-facing surface of a finished catalog.

use mapstone_core::{
    builder::UnitLoader,
    cache::{CacheKey, TransactionalCacheManager},
    convert::Converter as _,
    error::BuilderError,
    types::{LogicalType, StorageType, TypeDef},
    value::{StorageValue, Value},
};
use mapstone_schema::{
    node::{
        BindingDescriptor, CacheDescriptor, FieldDescriptor, NestedDescriptor,
        ResultMapDescriptor, StatementDescriptor, UnitDescriptor,
    },
    types::CommandKind,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn loader_with_model() -> UnitLoader {
    let mut loader = UnitLoader::new();
    let types = loader.catalog_mut().types_mut();

    types.register_type(
        TypeDef::structure("app.model.User")
            .property("id", LogicalType::Int64)
            .property("name", LogicalType::Text),
    );
    types.register_type(
        TypeDef::structure("app.model.Order")
            .property("id", LogicalType::Int64)
            .property("sku", LogicalType::Text)
            .property("code", LogicalType::Int64)
            .constructor([("code", LogicalType::Int64)]),
    );
    types.register_alias("User", "app.model.User");
    types.register_alias("Order", "app.model.Order");

    loader
}

fn select(id: &str, sql: &str) -> StatementDescriptor {
    StatementDescriptor::new(id, CommandKind::Select, sql)
}

fn field(property: &str, column: &str) -> BindingDescriptor {
    BindingDescriptor::Result(FieldDescriptor::new(property, column))
}

fn id_field(property: &str, column: &str) -> BindingDescriptor {
    BindingDescriptor::Id(FieldDescriptor::new(property, column))
}

#[test]
fn cache_ref_resolves_across_units_and_shares_one_cache_instance() {
    let mut loader = loader_with_model();

    // orders loads first and points at the not-yet-loaded users namespace
    let mut orders = UnitDescriptor::new("app.orders");
    orders.cache_ref = Some("app.users".to_string());
    orders
        .statements
        .push(select("findAll", "SELECT * FROM orders"));
    loader.load(&orders).unwrap();
    assert!(
        !loader.catalog().has_statement("app.orders.findAll"),
        "statements wait for the cache ref to resolve"
    );

    let mut users = UnitDescriptor::new("app.users");
    users.cache = Some(CacheDescriptor::default());
    loader.load(&users).unwrap();

    let catalog = loader.finish().unwrap();
    let statement = catalog.statement("app.orders.findAll").unwrap();
    let shared = catalog.cache("app.users").unwrap();
    let adopted = statement.cache().expect("statement carries the adopted cache");
    assert!(
        Arc::ptr_eq(&shared, adopted),
        "both namespaces share one cache instance"
    );

    // writes through one namespace's overlay are visible via the other
    // after commit
    let mut manager = TransactionalCacheManager::new();
    let mut key = CacheKey::new();
    key.update_str("app.orders.findAll");
    key.update_value(&Value::I64(7));

    manager.put(adopted, key.clone(), Value::Text("row".to_string()));
    assert!(
        shared.read().expect("cache lock poisoned").get(&key).is_none(),
        "overlay buffers until commit"
    );
    manager.commit();
    assert_eq!(
        shared.read().expect("cache lock poisoned").get(&key),
        Some(Value::Text("row".to_string()))
    );
}

#[test]
fn result_map_extends_resolves_regardless_of_unit_order() {
    let mut loader = loader_with_model();

    // child unit first: extends a parent map in a unit that loads later
    let mut child_unit = UnitDescriptor::new("app.child");
    let mut derived = ResultMapDescriptor::new("derived", "Order");
    derived.extends = Some("app.parent.base".to_string());
    derived.bindings.push(id_field("id", "id"));
    derived
        .bindings
        .push(BindingDescriptor::Arg(FieldDescriptor::new("code", "code")));
    child_unit.result_maps.push(derived);
    loader.load(&child_unit).unwrap();
    assert!(!loader.catalog().has_result_map("app.child.derived"));

    let mut parent_unit = UnitDescriptor::new("app.parent");
    let mut base = ResultMapDescriptor::new("base", "Order");
    base.bindings.push(id_field("id", "id"));
    base.bindings.push(field("sku", "sku"));
    parent_unit.result_maps.push(base);
    loader.load(&parent_unit).unwrap();

    let catalog = loader.finish().unwrap();
    let derived = catalog.result_map("app.child.derived").unwrap();

    // declared constructor stands alone; inherited non-constructor
    // bindings merge with duplicates removed
    let constructor: Vec<_> = derived
        .constructor_bindings()
        .map(|b| b.property().unwrap().to_string())
        .collect();
    assert_eq!(constructor, vec!["code"]);

    let properties: Vec<_> = derived
        .bindings()
        .iter()
        .map(|b| b.property().unwrap().to_string())
        .collect();
    assert_eq!(properties, vec!["id", "code", "sku"]);
}

#[test]
fn parent_constructor_bindings_are_dropped_when_child_declares_one() {
    let mut loader = loader_with_model();

    let mut parent_unit = UnitDescriptor::new("app.parent");
    let mut base = ResultMapDescriptor::new("base", "Order");
    base.bindings
        .push(BindingDescriptor::Arg(FieldDescriptor::new("code", "legacy_code")));
    base.bindings.push(field("sku", "sku"));
    parent_unit.result_maps.push(base);
    loader.load(&parent_unit).unwrap();

    let mut child_unit = UnitDescriptor::new("app.child");
    let mut derived = ResultMapDescriptor::new("derived", "Order");
    derived.extends = Some("app.parent.base".to_string());
    derived
        .bindings
        .push(BindingDescriptor::Arg(FieldDescriptor::new("code", "code")));
    child_unit.result_maps.push(derived);
    loader.load(&child_unit).unwrap();

    let catalog = loader.finish().unwrap();
    let derived = catalog.result_map("app.child.derived").unwrap();

    let columns: Vec<_> = derived
        .constructor_bindings()
        .map(|b| b.column().unwrap().to_string())
        .collect();
    assert_eq!(columns, vec!["code"], "inherited constructor must be dropped");
    assert!(derived.mapped_properties().contains("sku"));
}

#[test]
fn unresolvable_references_fail_the_build_with_an_aggregate_report() {
    let mut loader = loader_with_model();

    let mut unit = UnitDescriptor::new("app.users");
    let mut statement = select("findGhost", "SELECT * FROM users");
    statement.result_map = Some("ghostMap".to_string());
    unit.statements.push(statement);

    let mut orphan = UnitDescriptor::new("app.orphans");
    orphan.cache_ref = Some("app.missing".to_string());

    loader.load(&unit).unwrap();
    loader.load(&orphan).unwrap();

    let err = loader.finish().unwrap_err();
    let BuilderError::Unresolved(report) = &err else {
        panic!("expected the terminal aggregate error, got {err}");
    };
    assert_eq!(report.entries.len(), 2, "every broken reference is listed: {report}");

    let text = err.to_string();
    assert!(text.contains("statement 'app.users.findGhost'"));
    assert!(text.contains("app.users.ghostMap"));
    assert!(text.contains("cache ref 'app.orphans'"));
    assert!(text.contains("app.missing"));
}

#[test]
fn compiled_statements_resolve_bound_sql_with_typed_bindings() {
    let mut loader = loader_with_model();

    let mut unit = UnitDescriptor::new("app.users");
    let mut statement = select(
        "findByIdAndName",
        "SELECT * FROM users WHERE id = #{id} AND name = #{name:VARCHAR}",
    );
    statement.parameter_type = Some("User".to_string());
    statement.result_type = Some("User".to_string());
    unit.statements.push(statement);
    loader.load(&unit).unwrap();

    let catalog = loader.finish().unwrap();
    let statement = catalog.statement("app.users.findByIdAndName").unwrap();

    let mut param = BTreeMap::new();
    param.insert("id".to_string(), Value::I64(7));
    param.insert("name".to_string(), Value::Text("ada".to_string()));
    let bound = statement.bound_sql(Some(Value::Map(param)));

    assert_eq!(bound.sql(), "SELECT * FROM users WHERE id = ? AND name = ?");
    let bindings = bound.param_bindings();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].property_name(), "id");
    assert_eq!(bindings[0].logical_type(), &LogicalType::Int64);
    assert_eq!(bindings[1].storage(), Some(StorageType::Varchar));

    // the resolved converters are usable as-is by the executor
    let id_value = bound
        .parameter()
        .and_then(|p| p.field("id"))
        .expect("parameter object carries id");
    let stored = bindings[0]
        .converter()
        .to_storage(id_value, bindings[0].storage())
        .unwrap();
    assert_eq!(stored, StorageValue::I64(7));

    // inline result type compiles to an anonymous result map
    let result_map = &statement.result_maps()[0];
    assert_eq!(result_map.target_type(), &LogicalType::named("app.model.User"));
    assert!(statement.use_cache());
    assert!(!statement.flush_cache());
}

#[test]
fn nested_association_compiles_an_anonymous_inline_result_map() {
    let mut loader = loader_with_model();
    loader.catalog_mut().types_mut().register_type(
        TypeDef::structure("app.model.Account")
            .property("id", LogicalType::Int64)
            .property("owner", LogicalType::named("app.model.User")),
    );
    loader
        .catalog_mut()
        .types_mut()
        .register_alias("Account", "app.model.Account");

    let mut unit = UnitDescriptor::new("app.accounts");
    let mut map = ResultMapDescriptor::new("accountMap", "Account");
    map.bindings.push(id_field("id", "id"));
    map.bindings
        .push(BindingDescriptor::Association(NestedDescriptor {
            property: "owner".to_string(),
            bindings: vec![id_field("id", "owner_id"), field("name", "owner_name")],
            ..NestedDescriptor::default()
        }));
    unit.result_maps.push(map);
    loader.load(&unit).unwrap();

    let catalog = loader.finish().unwrap();
    let account_map = catalog.result_map("app.accounts.accountMap").unwrap();
    assert!(account_map.has_nested_result_maps());

    let owner = account_map
        .bindings()
        .iter()
        .find(|b| b.property() == Some("owner"))
        .unwrap();
    let nested_id = owner.nested_result_map().unwrap();
    assert_eq!(nested_id, "app.accounts.accountMap_association[owner]");

    let nested = catalog.result_map(nested_id).unwrap();
    assert_eq!(nested.target_type(), &LogicalType::named("app.model.User"));
    assert_eq!(nested.bindings().len(), 2);
}

#[test]
fn statements_fall_back_to_their_explicit_parameter_map() {
    let mut loader = loader_with_model();

    let mut unit = UnitDescriptor::new("app.users");
    unit.param_maps.push(mapstone_schema::node::ParamMapDescriptor {
        id: "userParams".to_string(),
        type_name: "User".to_string(),
        params: vec![
            mapstone_schema::node::ParamDescriptor::new("id"),
            mapstone_schema::node::ParamDescriptor::new("name"),
        ],
    });
    let mut statement = select("findByExample", "SELECT * FROM users WHERE id = ? AND name = ?");
    statement.parameter_map = Some("userParams".to_string());
    unit.statements.push(statement);
    loader.load(&unit).unwrap();

    let catalog = loader.finish().unwrap();
    let statement = catalog.statement("app.users.findByExample").unwrap();
    assert_eq!(statement.param_map().id(), "app.users.userParams");

    // no inline expressions compiled, so the explicit map supplies the slots
    let bound = statement.bound_sql(None);
    let properties: Vec<_> = bound
        .param_bindings()
        .iter()
        .map(|b| b.property_name().to_string())
        .collect();
    assert_eq!(properties, vec!["id", "name"]);
    assert_eq!(bound.param_bindings()[0].logical_type(), &LogicalType::Int64);
}

#[test]
fn loading_the_same_unit_twice_is_idempotent() {
    let mut loader = loader_with_model();

    let mut unit = UnitDescriptor::new("app.users");
    unit.statements.push(select("findAll", "SELECT * FROM users"));
    loader.load(&unit).unwrap();
    loader.load(&unit).unwrap();

    let catalog = loader.finish().unwrap();
    assert_eq!(catalog.statement_count(), 1);
}

#[test]
fn load_expecting_rejects_namespace_mismatches() {
    let mut loader = loader_with_model();
    let unit = UnitDescriptor::new("app.users");

    let err = loader.load_expecting("app.orders", &unit).unwrap_err();
    assert!(matches!(err, BuilderError::NamespaceMismatch { .. }));
}

#[test]
fn malformed_units_fail_fast_with_descriptor_errors() {
    let mut loader = loader_with_model();

    let mut unit = UnitDescriptor::new("app.users");
    unit.statements.push(select("findAll", "   "));

    let err = loader.load(&unit).unwrap_err();
    assert!(matches!(err, BuilderError::Descriptor(_)));
}

#[test]
fn dotted_statement_ids_are_rejected_at_validation() {
    let mut loader = loader_with_model();

    let mut unit = UnitDescriptor::new("app.users2");
    let mut statement = select("findAll", "SELECT 2");
    statement.id = "app.users.findAll".to_string();
    unit.statements.push(statement);

    let err = loader.load(&unit).unwrap_err();
    assert!(matches!(err, BuilderError::Descriptor(_)));
}
