//! Collection Record Module
//!
//! Durable shape of a user's collection and the migrations between shapes.
//!
//! | version | shape                                             |
//! |---------|---------------------------------------------------|
//! | 1       | bare JSON array, `quantity` may be missing        |
//! | 2       | `{"schemaVersion": 2, "items": [...]}`            |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::CollectionItem;
use crate::error::{Result, VaultError};

/// Version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

// == Record Envelope ==
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    items: Value,
}

/// A collection read from storage, already at the current version.
#[derive(Debug)]
pub struct DecodedRecord {
    pub items: Vec<CollectionItem>,
    /// Version the record was stored at
    pub stored_version: u32,
}

impl DecodedRecord {
    /// True when the stored bytes are older than the current shape.
    pub fn needs_rewrite(&self) -> bool {
        self.stored_version != CURRENT_SCHEMA_VERSION
    }
}

// == Decode ==
/// Parses a stored record and migrates it to the current version.
pub fn decode(key: &str, raw: &str) -> Result<DecodedRecord> {
    let value: Value = serde_json::from_str(raw).map_err(|e| VaultError::malformed(key, e))?;

    let (stored_version, mut items) = match value {
        Value::Array(_) => (1, value),
        Value::Object(_) => {
            let envelope: Envelope =
                serde_json::from_value(value).map_err(|e| VaultError::malformed(key, e))?;
            (envelope.schema_version, envelope.items)
        }
        other => {
            return Err(VaultError::malformed(
                key,
                format!("expected array or object, found {}", other),
            ))
        }
    };

    let mut version = stored_version;
    while version < CURRENT_SCHEMA_VERSION {
        items = migrate_step(version, items).map_err(|e| VaultError::malformed(key, e))?;
        version += 1;
    }
    if version != CURRENT_SCHEMA_VERSION {
        return Err(VaultError::malformed(
            key,
            format!("unsupported schema version {}", stored_version),
        ));
    }

    let items: Vec<CollectionItem> =
        serde_json::from_value(items).map_err(|e| VaultError::malformed(key, e))?;
    if let Some(bad) = items.iter().find(|item| item.quantity == 0) {
        return Err(VaultError::malformed(
            key,
            format!("item '{}' has quantity 0", bad.item_id),
        ));
    }

    Ok(DecodedRecord {
        items,
        stored_version,
    })
}

// == Encode ==
/// Serializes items at the current version.
pub fn encode(items: &[CollectionItem]) -> Result<String> {
    let envelope = Envelope {
        schema_version: CURRENT_SCHEMA_VERSION,
        items: serde_json::to_value(items).map_err(|e| VaultError::Internal(e.to_string()))?,
    };
    serde_json::to_string(&envelope).map_err(|e| VaultError::Internal(e.to_string()))
}

// == Migrations ==
/// Upgrades `items` from `from` to `from + 1`.
fn migrate_step(from: u32, items: Value) -> std::result::Result<Value, String> {
    match from {
        1 => migrate_v1_to_v2(items),
        other => Err(format!("no migration from schema version {}", other)),
    }
}

/// v1 items may lack `quantity`; every such item owned exactly one copy.
fn migrate_v1_to_v2(items: Value) -> std::result::Result<Value, String> {
    let Value::Array(mut entries) = items else {
        return Err("v1 record is not an array".to_string());
    };
    for entry in entries.iter_mut() {
        let Value::Object(fields) = entry else {
            return Err("v1 entry is not an object".to_string());
        };
        fields
            .entry("quantity")
            .or_insert_with(|| Value::from(1));
    }
    Ok(Value::Array(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_array_gains_quantity() {
        let decoded = decode("collection:ash", r#"[{"itemId":"a"}]"#).unwrap();

        assert_eq!(decoded.stored_version, 1);
        assert!(decoded.needs_rewrite());
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].item_id, "a");
        assert_eq!(decoded.items[0].quantity, 1);
    }

    #[test]
    fn test_legacy_migration_preserves_fields() {
        let raw = json!([
            {"id": "base1-4", "name": "Charizard", "addedDate": "2024-03-01T10:00:00.000Z", "rarity": "Rare Holo"},
            {"id": "base1-58", "name": "Pikachu", "quantity": 3}
        ])
        .to_string();
        let decoded = decode("collection:ash", &raw).unwrap();

        let charizard = &decoded.items[0];
        assert_eq!(charizard.quantity, 1);
        assert_eq!(
            charizard.added_date.unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
        assert_eq!(charizard.snapshot.attributes["rarity"], "Rare Holo");

        // entries that already had a quantity keep it
        assert_eq!(decoded.items[1].quantity, 3);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let first = decode("k", r#"[{"itemId":"a","name":"Abra"}]"#).unwrap();
        let rewritten = encode(&first.items).unwrap();

        let second = decode("k", &rewritten).unwrap();
        assert!(!second.needs_rewrite());
        assert_eq!(second.items, first.items);
        assert_eq!(encode(&second.items).unwrap(), rewritten);
    }

    #[test]
    fn test_current_record_round_trip_shape() {
        let encoded = encode(&[]).unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value, json!({"schemaVersion": 2, "items": []}));
    }

    #[test]
    fn test_garbage_is_malformed() {
        for raw in ["{oops", "42", r#"{"schemaVersion": 2, "items": [{"quantity": 1}]}"#] {
            let result = decode("collection:ash", raw);
            assert!(
                matches!(result, Err(VaultError::StorageMalformed { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_future_version_rejected() {
        let result = decode("k", r#"{"schemaVersion": 9, "items": []}"#);
        assert!(matches!(result, Err(VaultError::StorageMalformed { reason, .. }) if reason.contains("9")));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = decode("k", r#"{"schemaVersion": 2, "items": [{"itemId":"a","quantity":0}]}"#);
        assert!(matches!(result, Err(VaultError::StorageMalformed { .. })));
    }
}
