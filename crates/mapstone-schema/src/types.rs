use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

///
/// CommandKind
///
/// What a statement does to the storage medium. Only `Select` is a read;
/// the distinction drives the cache-use and cache-flush defaults.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, PartialEq, Serialize)]
#[remain::sorted]
pub enum CommandKind {
    Delete,
    Insert,
    Select,
    Update,
}

impl CommandKind {
    #[must_use]
    pub const fn is_select(self) -> bool {
        matches!(self, Self::Select)
    }
}

///
/// ParamMode
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, FromStr, PartialEq, Serialize,
)]
#[remain::sorted]
pub enum ParamMode {
    #[default]
    In,
    InOut,
    Out,
}

///
/// CacheImplKind
///
/// Backing implementation for a namespace cache. `Perpetual` is the plain
/// unbounded hash map store.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, FromStr, PartialEq, Serialize,
)]
#[remain::sorted]
pub enum CacheImplKind {
    #[default]
    Perpetual,
}

///
/// EvictionKind
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, FromStr, PartialEq, Serialize,
)]
#[remain::sorted]
pub enum EvictionKind {
    Fifo,
    #[default]
    Lru,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_kind_parses_from_descriptor_text() {
        assert_eq!("Select".parse::<CommandKind>().unwrap(), CommandKind::Select);
        assert!("Upsert".parse::<CommandKind>().is_err());
    }

    #[test]
    fn only_select_is_a_read() {
        assert!(CommandKind::Select.is_select());
        assert!(!CommandKind::Update.is_select());
    }
}
