//! ## Crate layout
//! - `builder`: descriptor loading, namespace context, deferred resolution.
//! - `cache`: cache configuration, eviction decorators, transactional overlay.
//! - `catalog`: the process-wide compiled registry handed to executors.
//! - `convert`: logical ↔ storage converters and the two-level registry.
//! - `mapping`: compiled statements, result maps, bindings, bound SQL.
//! - `obs`: build-event sink boundary (no logger dependency in core logic).
//! - `types`: logical/storage type model and declared type metadata.
//!
//! Descriptor shapes live in `mapstone-schema`; this crate compiles them.

pub mod builder;
pub mod cache;
pub mod catalog;
pub mod convert;
pub mod error;
pub mod mapping;
pub mod obs;
pub mod types;
pub mod value;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        builder::UnitLoader,
        catalog::Catalog,
        error::{BuilderError, Incomplete, LoadError, PendingKind},
        mapping::{BoundSql, ParamBinding, ResultBinding, ResultMap, Statement},
        types::{LogicalType, StorageType},
        value::{StorageValue, Value},
    };
    pub use mapstone_schema::prelude::*;
}
