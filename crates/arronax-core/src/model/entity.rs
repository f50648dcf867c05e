use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// The record types the explorer browses.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityKind {
    #[default]
    Blocks,
    Accounts,
    Operations,
}

impl EntityKind {
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Path segment used by the Conseil endpoints.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Accounts => "accounts",
            Self::Operations => "operations",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Blocks => "Blocks",
            Self::Accounts => "Accounts",
            Self::Operations => "Operations",
        }
    }

    /// Attribute a single record is looked up by.
    pub fn primary_key(self) -> &'static str {
        match self {
            Self::Blocks => "hash",
            Self::Accounts => "account_id",
            Self::Operations => "operation_group_hash",
        }
    }

    /// Attributes whose values are enum-like labels and are sent
    /// snake_cased and lowercased.
    pub fn normalized_attributes(self) -> &'static [&'static str] {
        match self {
            Self::Blocks => &[],
            Self::Accounts => &["spendable", "delegate_setable"],
            Self::Operations => &["kind", "status", "spendable", "delegatable"],
        }
    }
}

/// One value per entity kind, so per-entity state can never miss a kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerEntity<T> {
    blocks: T,
    accounts: T,
    operations: T,
}

impl<T> PerEntity<T> {
    pub fn get(&self, kind: EntityKind) -> &T {
        match kind {
            EntityKind::Blocks => &self.blocks,
            EntityKind::Accounts => &self.accounts,
            EntityKind::Operations => &self.operations,
        }
    }

    pub fn get_mut(&mut self, kind: EntityKind) -> &mut T {
        match kind {
            EntityKind::Blocks => &mut self.blocks,
            EntityKind::Accounts => &mut self.accounts,
            EntityKind::Operations => &mut self.operations,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &T)> {
        EntityKind::all().map(move |kind| (kind, self.get(kind)))
    }
}
