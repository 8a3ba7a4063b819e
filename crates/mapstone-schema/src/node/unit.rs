use crate::{
    error::ErrorTree,
    node::{
        CacheDescriptor, ConverterDescriptor, ParamMapDescriptor, ResultMapDescriptor,
        StatementDescriptor,
    },
    validate::{ValidateNode, validate_namespace},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

///
/// UnitDescriptor
///
/// One independently loadable namespace of descriptors, in encounter order.
/// Units may reference each other's ids; load order across units is
/// arbitrary and resolved by the compiler's deferred-resolution pass.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UnitDescriptor {
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub converters: Vec<ConverterDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_maps: Vec<ParamMapDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_maps: Vec<ResultMapDescriptor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<StatementDescriptor>,
}

impl UnitDescriptor {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

impl ValidateNode for UnitDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(e) = validate_namespace(&self.namespace) {
            errs.add(e);
        }

        // ids must be unique within their own unit; cross-unit clashes are
        // caught later by the catalog's strict registries
        let mut seen = HashSet::new();
        for statement in &self.statements {
            if !seen.insert(statement.id.as_str()) {
                errs.add_at(
                    format!("statements.{}", statement.id),
                    "duplicate statement id within unit",
                );
            }
        }
        seen.clear();
        for result_map in &self.result_maps {
            if !seen.insert(result_map.id.as_str()) {
                errs.add_at(
                    format!("result_maps.{}", result_map.id),
                    "duplicate result map id within unit",
                );
            }
        }

        for statement in &self.statements {
            if let Err(tree) = statement.validate() {
                errs.merge(&format!("statements.{}", statement.id), tree);
            }
        }
        for result_map in &self.result_maps {
            if let Err(tree) = result_map.validate() {
                errs.merge(&format!("result_maps.{}", result_map.id), tree);
            }
        }
        for param_map in &self.param_maps {
            if let Err(tree) = param_map.validate() {
                errs.merge(&format!("param_maps.{}", param_map.id), tree);
            }
        }

        errs.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandKind;

    fn statement(id: &str) -> StatementDescriptor {
        StatementDescriptor::new(id, CommandKind::Select, "SELECT 1")
    }

    #[test]
    fn duplicate_statement_ids_are_rejected() {
        let mut unit = UnitDescriptor::new("app.users");
        unit.statements.push(statement("findAll"));
        unit.statements.push(statement("findAll"));

        let err = unit.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate statement id"));
    }

    #[test]
    fn well_formed_unit_passes() {
        let mut unit = UnitDescriptor::new("app.users");
        unit.statements.push(statement("findAll"));
        assert!(unit.validate().is_ok());
    }

    #[test]
    fn deserializes_reader_output() {
        let unit: UnitDescriptor = serde_json::from_str(
            r#"{
                "namespace": "app.users",
                "statements": [
                    { "id": "findAll", "kind": "Select", "sql": "SELECT * FROM users" }
                ]
            }"#,
        )
        .expect("descriptor json should deserialize");

        assert_eq!(unit.namespace, "app.users");
        assert_eq!(unit.statements.len(), 1);
        assert!(unit.validate().is_ok());
    }
}
