use serde::{Deserialize, Serialize};
use std::fmt;

///
/// ErrorTree
///
/// Route-keyed aggregation of validation failures so a whole descriptor is
/// checked in one pass and every problem is reported at once.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorTree {
    entries: Vec<ErrorTreeEntry>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorTreeEntry {
    pub route: String,
    pub message: String,
}

impl ErrorTree {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a failure at the current route.
    pub fn add(&mut self, message: impl Into<String>) {
        self.add_at("", message);
    }

    /// Record a failure under an explicit route key.
    pub fn add_at(&mut self, route: impl Into<String>, message: impl Into<String>) {
        self.entries.push(ErrorTreeEntry {
            route: route.into(),
            message: message.into(),
        });
    }

    /// Fold a child tree into this one, prefixing every entry with `route`.
    pub fn merge(&mut self, route: &str, child: Self) {
        for entry in child.entries {
            let route = if entry.route.is_empty() {
                route.to_string()
            } else {
                format!("{route}.{}", entry.route)
            };
            self.entries.push(ErrorTreeEntry {
                route,
                message: entry.message,
            });
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ErrorTreeEntry> {
        self.entries.iter()
    }

    /// Collapse into a `Result`, returning `self` only if anything was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if entry.route.is_empty() {
                write!(f, "{}", entry.message)?;
            } else {
                write!(f, "{}: {}", entry.route, entry.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_resolves_ok() {
        assert!(ErrorTree::new().result().is_ok());
    }

    #[test]
    fn merge_prefixes_child_routes() {
        let mut child = ErrorTree::new();
        child.add("name is empty");
        child.add_at("column", "unknown column");

        let mut root = ErrorTree::new();
        root.merge("result_maps.user", child);

        let routes: Vec<_> = root.entries().map(|e| e.route.clone()).collect();
        assert_eq!(routes, vec!["result_maps.user", "result_maps.user.column"]);
    }
}
