use crate::{mapping::ParamBinding, types::PropertyPath, value::Value};
use std::collections::BTreeMap;

///
/// SqlSource
///
/// The compiled SQL template: placeholder spans replaced with `?` and one
/// parameter binding per span, in encounter order. Static after build;
/// binding order never changes between executions.
///

#[derive(Clone, Debug)]
pub struct SqlSource {
    sql: String,
    bindings: Vec<ParamBinding>,
}

impl SqlSource {
    #[must_use]
    pub fn new(sql: impl Into<String>, bindings: Vec<ParamBinding>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }
}

///
/// BoundSql
///
/// Final SQL text plus the ordered parameter bindings for one execution,
/// with room for additional parameters created by the scripting layer.
///

#[derive(Clone, Debug)]
pub struct BoundSql {
    sql: String,
    param_bindings: Vec<ParamBinding>,
    parameter: Option<Value>,
    additional: BTreeMap<String, Value>,
}

impl BoundSql {
    #[must_use]
    pub fn new(
        sql: impl Into<String>,
        param_bindings: Vec<ParamBinding>,
        parameter: Option<Value>,
    ) -> Self {
        Self {
            sql: sql.into(),
            param_bindings,
            parameter,
            additional: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn param_bindings(&self) -> &[ParamBinding] {
        &self.param_bindings
    }

    #[must_use]
    pub const fn parameter(&self) -> Option<&Value> {
        self.parameter.as_ref()
    }

    #[must_use]
    pub fn has_additional_param(&self, name: &str) -> bool {
        let head = PropertyPath::parse(name);
        self.additional.contains_key(head.head())
    }

    pub fn set_additional_param(&mut self, name: impl Into<String>, value: Value) {
        self.additional.insert(name.into(), value);
    }

    #[must_use]
    pub fn additional_param(&self, name: &str) -> Option<&Value> {
        self.additional.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additional_params_resolve_by_path_head() {
        let mut bound = BoundSql::new("SELECT 1", Vec::new(), None);
        bound.set_additional_param("item", Value::I64(3));

        assert!(bound.has_additional_param("item"));
        assert!(bound.has_additional_param("item.sku"), "nested paths check the head name");
        assert!(!bound.has_additional_param("other"));
    }
}
