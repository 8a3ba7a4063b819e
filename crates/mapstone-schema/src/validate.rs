use crate::{MAX_ID_LEN, MAX_NAMESPACE_LEN, NAMESPACE_SEPARATOR, error::ErrorTree};

///
/// ValidateNode
///
/// Structural validation local to one descriptor node. Cross-namespace
/// checks (forward references, type resolution) belong to the compiler,
/// not the node layer.
///

pub trait ValidateNode {
    fn validate(&self) -> Result<(), ErrorTree> {
        Ok(())
    }
}

/// Ensure a simple (unqualified) id is non-empty, ASCII, undotted, and short enough.
pub(crate) fn validate_simple_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("id is empty".to_string());
    }
    if id.len() > MAX_ID_LEN {
        return Err(format!("id '{id}' exceeds max length {MAX_ID_LEN}"));
    }
    if !id.is_ascii() {
        return Err(format!("id '{id}' must be ASCII"));
    }
    if id.contains(NAMESPACE_SEPARATOR) {
        return Err(format!("id '{id}' must not contain '{NAMESPACE_SEPARATOR}'"));
    }

    Ok(())
}

/// Ensure a namespace is non-empty, ASCII, and within the maximum length.
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), String> {
    if namespace.is_empty() {
        return Err("namespace is empty".to_string());
    }
    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(format!(
            "namespace '{namespace}' exceeds max length {MAX_NAMESPACE_LEN}"
        ));
    }
    if !namespace.is_ascii() {
        return Err(format!("namespace '{namespace}' must be ASCII"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dotted_and_empty_ids() {
        assert!(validate_simple_id("").is_err());
        assert!(
            validate_simple_id("users.findAll").is_err(),
            "dotted ids are reserved for qualified references"
        );
    }

    #[test]
    fn accepts_plain_ids_and_dotted_namespaces() {
        assert!(validate_simple_id("findAll").is_ok());
        assert!(validate_namespace("app.mapper.users").is_ok());
    }
}
