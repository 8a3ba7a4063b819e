use crate::{
    error::ErrorTree,
    types::CommandKind,
    validate::{ValidateNode, validate_simple_id},
};
use serde::{Deserialize, Serialize};

///
/// StatementDescriptor
///
/// One executable statement declaration: SQL template text with inline
/// parameter expressions, plus the references and flags the compiler
/// resolves into a `Statement`. `flush_cache`/`use_cache` are tri-state;
/// unset means "default for the command kind".
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StatementDescriptor {
    pub id: String,
    pub kind: CommandKind,
    pub sql: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_map: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,

    /// Comma-separated result map references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_map: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_cache: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_size: Option<u32>,

    /// Statement timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    #[serde(default)]
    pub result_ordered: bool,
}

impl StatementDescriptor {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: CommandKind, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            sql: sql.into(),
            parameter_map: None,
            parameter_type: None,
            result_map: None,
            result_type: None,
            flush_cache: None,
            use_cache: None,
            fetch_size: None,
            timeout: None,
            result_ordered: false,
        }
    }

    /// Split the comma-separated result map reference list.
    pub fn result_map_refs(&self) -> impl Iterator<Item = &str> {
        self.result_map
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl ValidateNode for StatementDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(e) = validate_simple_id(&self.id) {
            errs.add(e);
        }
        if self.sql.trim().is_empty() {
            errs.add("sql template is empty");
        }

        errs.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_map_refs_are_split_and_trimmed() {
        let mut statement =
            StatementDescriptor::new("findAll", CommandKind::Select, "SELECT * FROM users");
        statement.result_map = Some("userMap, app.orders.orderMap".to_string());

        let refs: Vec<_> = statement.result_map_refs().collect();
        assert_eq!(refs, vec!["userMap", "app.orders.orderMap"]);
    }

    #[test]
    fn empty_sql_is_rejected() {
        let statement = StatementDescriptor::new("findAll", CommandKind::Select, "   ");
        assert!(statement.validate().is_err());
    }
}
