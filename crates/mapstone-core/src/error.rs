use crate::{
    builder::ExprError,
    catalog::RegistryError,
    convert::ConverterError,
    types::TypeError,
};
use derive_more::Display;
use mapstone_schema::error::ErrorTree;
use std::fmt;
use thiserror::Error as ThisError;

///
/// BuilderError
///
/// Fatal compilation failure: a malformed or contradictory descriptor.
/// Raised immediately; never retried by the deferred-resolution loop.
///

#[derive(Debug, ThisError)]
pub enum BuilderError {
    #[error("wrong namespace: expected '{expected}', found '{found}'")]
    NamespaceMismatch { expected: String, found: String },

    #[error("dots are not allowed in simple ids, remove it from '{id}'")]
    DottedSimpleId { id: String },

    #[error(
        "failed to find a constructor in '{type_name}' matching arg names {arg_names:?} while building result map '{result_map}'"
    )]
    ConstructorMismatch {
        result_map: String,
        type_name: String,
        arg_names: Vec<String>,
    },

    #[error("unclosed inline parameter '#{{' at byte {position} in sql template")]
    UnclosedPlaceholder { position: usize },

    #[error("expression based inline parameters are not supported in sql templates: '({expression})'")]
    ExpressionParam { expression: String },

    #[error("invalid inline parameter option {name}='{value}'")]
    InvalidOption { name: String, value: String },

    #[error("malformed composite column spec '{column}'")]
    CompositeColumn { column: String },

    #[error("descriptor validation failed:\n{0}")]
    Descriptor(ErrorTree),

    #[error(transparent)]
    Converter(#[from] ConverterError),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("{0}")]
    Unresolved(UnresolvedReport),
}

impl BuilderError {
    /// Coarse classification for the executor-facing surface.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NamespaceMismatch { .. }
            | Self::DottedSimpleId { .. }
            | Self::ConstructorMismatch { .. }
            | Self::UnclosedPlaceholder { .. }
            | Self::ExpressionParam { .. }
            | Self::InvalidOption { .. }
            | Self::CompositeColumn { .. }
            | Self::Descriptor(_)
            | Self::Expr(_) => ErrorClass::Malformed,
            Self::Converter(_) | Self::Type(_) => ErrorClass::Resolution,
            Self::Registry(err) => err.class(),
            Self::Unresolved(_) => ErrorClass::Unresolved,
        }
    }
}

///
/// ErrorClass
/// Internal taxonomy for build failures. Not a stable API.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    #[display("conflict")]
    Conflict,
    #[display("malformed")]
    Malformed,
    #[display("not_found")]
    NotFound,
    #[display("resolution")]
    Resolution,
    #[display("unresolved")]
    Unresolved,
}

///
/// PendingKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PendingKind {
    CacheRef,
    ParamMap,
    ResultMap,
    Statement,
}

impl fmt::Display for PendingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CacheRef => "cache ref",
            Self::ParamMap => "parameter map",
            Self::ResultMap => "result map",
            Self::Statement => "statement",
        };
        write!(f, "{label}")
    }
}

///
/// Incomplete
///
/// Recoverable forward-reference signal: a dependency is not loaded *yet*.
/// Caught by the deferred-resolution coordinator, never surfaced from a
/// finished build except through the terminal [`UnresolvedReport`].
///

#[derive(Clone, Debug, ThisError)]
#[error("{kind} '{reference}' is not yet resolvable")]
pub struct Incomplete {
    pub kind: PendingKind,
    pub reference: String,
}

impl Incomplete {
    #[must_use]
    pub fn new(kind: PendingKind, reference: impl Into<String>) -> Self {
        Self {
            kind,
            reference: reference.into(),
        }
    }
}

///
/// LoadError
///
/// Outcome of one declaration attempt during loading. `Incomplete` items are
/// parked for retry; `Builder` failures abort the whole load.
///

#[derive(Debug, ThisError)]
pub enum LoadError {
    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    Incomplete(#[from] Incomplete),
}

impl From<RegistryError> for LoadError {
    fn from(err: RegistryError) -> Self {
        Self::Builder(err.into())
    }
}

impl From<TypeError> for LoadError {
    fn from(err: TypeError) -> Self {
        Self::Builder(err.into())
    }
}

impl From<ConverterError> for LoadError {
    fn from(err: ConverterError) -> Self {
        Self::Builder(err.into())
    }
}

///
/// UnresolvedReport
///
/// Terminal aggregate of every declaration still pending after the final
/// unit loaded, so all broken references surface at once.
///

#[derive(Clone, Debug, Default)]
pub struct UnresolvedReport {
    pub entries: Vec<UnresolvedEntry>,
}

#[derive(Clone, Debug)]
pub struct UnresolvedEntry {
    pub kind: PendingKind,
    /// Qualified id of the declaration that could not be completed.
    pub id: String,
    /// The dependency it was waiting for.
    pub reference: String,
}

impl UnresolvedReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, kind: PendingKind, id: impl Into<String>, reference: impl Into<String>) {
        self.entries.push(UnresolvedEntry {
            kind,
            id: id.into(),
            reference: reference.into(),
        });
    }
}

impl fmt::Display for UnresolvedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} declaration(s) could not be resolved by the end of the load:",
            self.entries.len()
        )?;
        for entry in &self.entries {
            writeln!(
                f,
                "  - {} '{}' waiting on '{}'",
                entry.kind, entry.id, entry.reference
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_report_lists_every_entry() {
        let mut report = UnresolvedReport::default();
        report.push(PendingKind::Statement, "app.users.findAll", "app.users.userMap");
        report.push(PendingKind::CacheRef, "app.orders", "app.archive");

        let text = BuilderError::Unresolved(report).to_string();
        assert!(text.contains("statement 'app.users.findAll' waiting on 'app.users.userMap'"));
        assert!(text.contains("cache ref 'app.orders' waiting on 'app.archive'"));
    }

    #[test]
    fn incomplete_signal_names_kind_and_reference() {
        let signal = Incomplete::new(PendingKind::ResultMap, "app.users.parentMap");
        assert_eq!(
            signal.to_string(),
            "result map 'app.users.parentMap' is not yet resolvable"
        );
    }
}
