//! Item identifiers.
//!
//! Items are keyed by ULID so that ids sort by creation time and can be minted
//! without coordination. `Display` adds an `item-` prefix; `FromStr` accepts the
//! id with or without it, so ids printed by the CLI can be pasted back in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

const PREFIX: &str = "item-";

/// Identifier of a queued item, stable for the item's lifetime.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Ulid);

impl ItemId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for ItemId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(PREFIX).unwrap_or(s);
        Ulid::from_string(raw).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        let id = ItemId::from_ulid(Ulid::new());
        assert!(id.to_string().starts_with("item-"));
    }

    #[test]
    fn parses_with_and_without_prefix() {
        let id = ItemId::from_ulid(Ulid::new());
        let with: ItemId = id.to_string().parse().unwrap();
        let without: ItemId = id.as_ulid().to_string().parse().unwrap();
        assert_eq!(with, id);
        assert_eq!(without, id);
        assert!("item-not-a-ulid".parse::<ItemId>().is_err());
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = ItemId::from_ulid(Ulid::new());
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.as_ulid().to_string()));
    }

    #[test]
    fn ids_are_sortable_by_creation() {
        let a = ItemId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = ItemId::from_ulid(Ulid::new());
        assert!(a < b);
    }
}
