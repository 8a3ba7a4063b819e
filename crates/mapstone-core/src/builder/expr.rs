use thiserror::Error as ThisError;

///
/// ExprError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("parse error in inline expression '{{{expression}}}' at byte {position}")]
pub struct ExprError {
    pub expression: String,
    pub position: usize,
}

/// Reserved output key for the leading property path.
pub const KEY_PROPERTY: &str = "property";
/// Reserved output key for a bracketed free-form expression.
pub const KEY_EXPRESSION: &str = "expression";
/// Reserved output key for the `:storageType` suffix.
pub const KEY_STORAGE_TYPE: &str = "storage_type";

///
/// InlineExpression
///
/// Parsed form of one embedded placeholder:
///
/// ```text
/// inline-parameter = (property | '(' expression ')') (':' storageType)? (',' name '=' value)*
/// ```
///
/// Keys keep encounter order; interior whitespace around `:`, `,` and `=`
/// is insignificant.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InlineExpression {
    entries: Vec<(String, String)>,
}

impl InlineExpression {
    pub fn parse(expression: &str) -> Result<Self, ExprError> {
        let mut parsed = Self::default();
        let p = skip_ws(expression, 0);
        if expression.as_bytes().get(p) == Some(&b'(') {
            parsed.expression_part(expression, p + 1)?;
        } else {
            parsed.property_part(expression, p)?;
        }

        Ok(parsed)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn property(&self) -> Option<&str> {
        self.get(KEY_PROPERTY)
    }

    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.get(KEY_EXPRESSION)
    }

    #[must_use]
    pub fn storage_type(&self) -> Option<&str> {
        self.get(KEY_STORAGE_TYPE)
    }

    /// Every parsed key/value pair, in encounter order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Option pairs only (everything after the reserved keys).
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(k, _)| {
                k.as_str() != KEY_PROPERTY
                    && k.as_str() != KEY_EXPRESSION
                    && k.as_str() != KEY_STORAGE_TYPE
            })
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn put(&mut self, key: &str, value: String) {
        self.entries.push((key.to_string(), value));
    }

    // '(' already consumed; scan a balanced-parenthesis span.
    fn expression_part(&mut self, expr: &str, left: usize) -> Result<(), ExprError> {
        let bytes = expr.as_bytes();
        let mut match_depth = 1usize;
        let mut right = left;
        while match_depth > 0 {
            match bytes.get(right) {
                Some(b')') => match_depth -= 1,
                Some(b'(') => match_depth += 1,
                Some(_) => {}
                None => return Err(err_at(expr, expr.len())),
            }
            right += 1;
        }
        self.put(KEY_EXPRESSION, expr[left..right - 1].to_string());
        self.storage_type_opt(expr, right)
    }

    fn property_part(&mut self, expr: &str, left: usize) -> Result<(), ExprError> {
        if left < expr.len() {
            let right = skip_until(expr, left, b",:");
            self.put(KEY_PROPERTY, trimmed(expr, left, right));
            self.storage_type_opt(expr, right)?;
        }

        Ok(())
    }

    fn storage_type_opt(&mut self, expr: &str, p: usize) -> Result<(), ExprError> {
        let p = skip_ws(expr, p);
        match expr.as_bytes().get(p) {
            None => Ok(()),
            Some(b':') => self.storage_type_part(expr, p + 1),
            Some(b',') => self.option_part(expr, p + 1),
            Some(_) => Err(err_at(expr, p)),
        }
    }

    fn storage_type_part(&mut self, expr: &str, p: usize) -> Result<(), ExprError> {
        let left = skip_ws(expr, p);
        let right = skip_until(expr, left, b",");
        if right <= left {
            // dangling ':' with no following token
            return Err(err_at(expr, p));
        }
        self.put(KEY_STORAGE_TYPE, trimmed(expr, left, right));
        self.option_part(expr, right + 1)
    }

    fn option_part(&mut self, expr: &str, p: usize) -> Result<(), ExprError> {
        let left = skip_ws(expr, p);
        if left >= expr.len() {
            return Ok(());
        }
        let eq = skip_until(expr, left, b"=");
        if eq >= expr.len() {
            // option without '='
            return Err(err_at(expr, left));
        }
        let name = trimmed(expr, left, eq);
        let value_end = skip_until(expr, eq + 1, b",");
        let value = trimmed(expr, eq + 1, value_end);
        self.put(&name, value);
        self.option_part(expr, value_end + 1)
    }
}

fn err_at(expr: &str, position: usize) -> ExprError {
    ExprError {
        expression: expr.to_string(),
        position,
    }
}

fn skip_ws(expr: &str, p: usize) -> usize {
    let bytes = expr.as_bytes();
    let mut i = p;
    while i < bytes.len() && bytes[i] <= 0x20 {
        i += 1;
    }
    i
}

fn skip_until(expr: &str, p: usize, end_chars: &[u8]) -> usize {
    let bytes = expr.as_bytes();
    let mut i = p;
    while i < bytes.len() && !end_chars.contains(&bytes[i]) {
        i += 1;
    }
    i
}

fn trimmed(expr: &str, start: usize, end: usize) -> String {
    let bytes = expr.as_bytes();
    let mut start = start;
    let mut end = end.min(bytes.len());
    while start < end && bytes[start] <= 0x20 {
        start += 1;
    }
    while end > start && bytes[end - 1] <= 0x20 {
        end -= 1;
    }
    expr[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(parsed: &InlineExpression) -> Vec<(String, String)> {
        parsed.entries().to_vec()
    }

    #[test]
    fn property_with_storage_type_and_options() {
        let parsed = InlineExpression::parse("prop:VARCHAR,a=1,b=2").unwrap();
        assert_eq!(
            pairs(&parsed),
            vec![
                ("property".to_string(), "prop".to_string()),
                ("storage_type".to_string(), "VARCHAR".to_string()),
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn interior_whitespace_is_insignificant() {
        for text in [
            "prop : VARCHAR , a = 1 , b = 2",
            "  prop:VARCHAR,a=1,b=2  ",
            "prop\t:\tVARCHAR\t,\ta\t=\t1\t,\tb\t=\t2",
        ] {
            let parsed = InlineExpression::parse(text).unwrap();
            assert_eq!(parsed.property(), Some("prop"), "input: {text:?}");
            assert_eq!(parsed.storage_type(), Some("VARCHAR"));
            assert_eq!(parsed.get("a"), Some("1"));
            assert_eq!(parsed.get("b"), Some("2"));
        }
    }

    #[test]
    fn bracketed_expression_with_storage_type() {
        let parsed = InlineExpression::parse("(a+b):NUMERIC").unwrap();
        assert_eq!(parsed.expression(), Some("a+b"));
        assert_eq!(parsed.storage_type(), Some("NUMERIC"));
        assert_eq!(parsed.property(), None);
    }

    #[test]
    fn nested_parentheses_are_balanced() {
        let parsed = InlineExpression::parse("((a+b)*(c-d))").unwrap();
        assert_eq!(parsed.expression(), Some("(a+b)*(c-d)"));
    }

    #[test]
    fn dangling_colon_is_a_parse_error() {
        let err = InlineExpression::parse("prop:").unwrap_err();
        assert_eq!(err.position, 5);
    }

    #[test]
    fn option_without_equals_is_a_parse_error() {
        let err = InlineExpression::parse("prop,mode").unwrap_err();
        assert_eq!(err.position, 5);
    }

    #[test]
    fn unbalanced_expression_is_a_parse_error() {
        assert!(InlineExpression::parse("(a+b").is_err());
    }

    #[test]
    fn property_only() {
        let parsed = InlineExpression::parse("user.address.city").unwrap();
        assert_eq!(parsed.property(), Some("user.address.city"));
        assert_eq!(parsed.storage_type(), None);
        assert_eq!(parsed.options().count(), 0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // any identifier-shaped property with arbitrary option pairs
            // round-trips regardless of injected whitespace
            #[test]
            fn parses_generated_option_lists(
                prop in "[a-zA-Z][a-zA-Z0-9_.]{0,12}",
                storage in "[A-Z]{2,9}",
                options in proptest::collection::hash_map(
                    "[a-zA-Z][a-zA-Z0-9]{0,6}",
                    "[a-zA-Z0-9]{1,6}",
                    0..4
                ),
                pad in "[ \t]{0,2}",
            ) {
                let mut text = format!("{pad}{prop}{pad}:{pad}{storage}{pad}");
                for (name, value) in &options {
                    text.push_str(&format!(",{pad}{name}{pad}={pad}{value}{pad}"));
                }

                let parsed = InlineExpression::parse(&text).unwrap();
                prop_assert_eq!(parsed.property(), Some(prop.as_str()));
                prop_assert_eq!(parsed.storage_type(), Some(storage.as_str()));
                for (name, value) in &options {
                    prop_assert_eq!(parsed.get(name), Some(value.as_str()));
                }
            }
        }
    }
}
