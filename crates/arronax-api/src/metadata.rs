// Conseil metadata types.
//
// Field names follow the JSON the metadata endpoints return (camelCase).
// Unknown fields are ignored and unknown enum values are tolerated, since the
// server adds attribute hints between releases.

use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDefinition {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDefinition {
    pub name: String,
    pub display_name: String,
    pub platform: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefinition {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_plural: Option<String>,
}

/// Column type as reported by the metadata endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum DataType {
    Int,
    LargeInt,
    Decimal,
    Boolean,
    DateTime,
    String,
    Hash,
    AccountAddress,
    Currency,
    #[serde(other)]
    Unknown,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int | Self::LargeInt | Self::Decimal | Self::Currency
        )
    }
}

/// Whether an attribute identifies a single record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum KeyType {
    UniqueKey,
    #[default]
    NonKey,
    #[serde(other)]
    Unknown,
}

/// One column of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    pub name: String,
    pub display_name: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<u64>,
    #[serde(default)]
    pub key_type: KeyType,
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl AttributeDefinition {
    pub fn is_unique_key(&self) -> bool {
        self.key_type == KeyType::UniqueKey
    }

    /// Attributes with a small distinct-value count can be offered as a dropdown.
    pub fn is_low_cardinality(&self) -> bool {
        self.cardinality.is_some_and(|c| c <= 100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn attribute_parses_server_shape() {
        let attr: AttributeDefinition = serde_json::from_value(json!({
            "name": "kind",
            "displayName": "Kind",
            "dataType": "String",
            "cardinality": 12,
            "keyType": "NonKey",
            "entity": "operations",
            "valueMap": {"transaction": "Transaction"}
        }))
        .unwrap();

        assert_eq!(attr.display_name, "Kind");
        assert_eq!(attr.data_type, DataType::String);
        assert!(!attr.is_unique_key());
        assert!(attr.is_low_cardinality());
    }

    #[test]
    fn unknown_data_type_is_tolerated() {
        let attr: AttributeDefinition = serde_json::from_value(json!({
            "name": "script",
            "displayName": "Script",
            "dataType": "Binary",
            "keyType": "UniqueKey",
            "entity": "accounts"
        }))
        .unwrap();

        assert_eq!(attr.data_type, DataType::Unknown);
        assert!(attr.is_unique_key());
        assert!(!attr.is_low_cardinality());
    }

    #[test]
    fn entity_count_defaults_to_zero() {
        let entity: EntityDefinition = serde_json::from_value(json!({
            "name": "blocks",
            "displayName": "Blocks"
        }))
        .unwrap();
        assert_eq!(entity.count, 0);
    }
}
