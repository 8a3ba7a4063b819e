//! ## Crate layout
//! - `core`: the compiler pipeline, compiled model, registries, and caches.
//! - `schema`: descriptor node shapes consumed from external readers.
//!
//! The `prelude` module mirrors the surface a query-executor integration
//! uses: load units, finish the catalog, look up statements and maps.

pub use mapstone_core as core;
pub use mapstone_schema as schema;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use mapstone_core::{catalog::Catalog, error::BuilderError};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        builder::{BuilderAssistant, InlineExpression, UnitLoader},
        cache::{CacheBuilder, CacheKey, TransactionalCacheManager},
        catalog::{Catalog, CatalogSettings},
        convert::{Converter, ConverterRegistry},
        error::{BuilderError, Incomplete, LoadError, PendingKind},
        mapping::{BoundSql, ParamBinding, ParamMap, ResultBinding, ResultMap, Statement},
        types::{LogicalType, PropertyPath, StorageType, TypeDef, TypeRegistry},
        value::{EnumValue, StorageValue, Value},
    };
    pub use crate::schema::prelude::*;
}
