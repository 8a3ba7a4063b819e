pub mod error;
pub mod node;
pub mod types;
pub mod validate;

/// Maximum length for namespace identifiers.
pub const MAX_NAMESPACE_LEN: usize = 128;

/// Maximum length for simple (unqualified) descriptor identifiers.
pub const MAX_ID_LEN: usize = 64;

/// Separator between a namespace and a simple id in qualified names.
pub const NAMESPACE_SEPARATOR: char = '.';

use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        error::ErrorTree,
        node::*,
        types::{CacheImplKind, CommandKind, EvictionKind, ParamMode},
        validate::ValidateNode,
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(error::ErrorTree),
}
