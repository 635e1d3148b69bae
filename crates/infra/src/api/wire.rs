//! Wire codec for the Listonic JSON dialect.
//!
//! The service emits PascalCase field names (`Name`, `Checked`, `Amount`)
//! but some deployments answer in camelCase, so decoding tries PascalCase
//! first, falls back to camelCase, and finally to a default. Decoding is
//! tolerant by design: a malformed field degrades to its default with a
//! warning instead of failing the whole payload. Outgoing bodies are always
//! PascalCase and sparse.

use listonic_domain::{ShoppingItem, ShoppingList};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Body for item creation. Quantity and unit are omitted when absent.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Amount", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(rename = "Unit", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Body for list creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewList {
    #[serde(rename = "Name")]
    pub name: String,
}

/// Decode a single item from either casing convention.
///
/// Identity preference: numeric `IdAsNumber`, then `Id`/`id` (numeric or
/// numeric string), then 0.
pub fn decode_item(value: &Value) -> ShoppingItem {
    let id = value
        .get("IdAsNumber")
        .and_then(Value::as_i64)
        .or_else(|| parse_id(value, "Id", "id"))
        .unwrap_or(0);

    ShoppingItem {
        id,
        name: string_field(value, "Name", "name").unwrap_or_default(),
        is_checked: decode_checked(value),
        quantity: string_field(value, "Amount", "quantity"),
        unit: string_field(value, "Unit", "unit"),
        price: field(value, "Price", "price").and_then(Value::as_f64),
        description: string_field(value, "Description", "description"),
        category_id: field(value, "CategoryId", "categoryId").and_then(Value::as_i64),
    }
}

/// Decode a list with its items.
///
/// A list is archived when it is inactive (`Active == 0`) or deleted
/// (`Deleted == 1`); absent flags default to active and not deleted.
pub fn decode_list(value: &Value) -> ShoppingList {
    let items = field(value, "Items", "items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(decode_item).collect())
        .unwrap_or_default();

    let active = field(value, "Active", "active").and_then(Value::as_i64).unwrap_or(1);
    let deleted = field(value, "Deleted", "deleted").and_then(Value::as_i64).unwrap_or(0);

    ShoppingList {
        id: parse_id(value, "Id", "id").unwrap_or(0),
        name: string_field(value, "Name", "name").unwrap_or_default(),
        items,
        is_archived: active == 0 || deleted == 1,
    }
}

fn field<'a>(value: &'a Value, pascal: &str, camel: &str) -> Option<&'a Value> {
    value.get(pascal).or_else(|| value.get(camel)).filter(|v| !v.is_null())
}

fn string_field(value: &Value, pascal: &str, camel: &str) -> Option<String> {
    field(value, pascal, camel).and_then(Value::as_str).map(str::to_owned)
}

/// Ids arrive as numeric strings in most payloads and as numbers in a few.
fn parse_id(value: &Value, pascal: &str, camel: &str) -> Option<i64> {
    let raw = field(value, pascal, camel)?;
    if let Some(id) = raw.as_i64() {
        return Some(id);
    }
    match raw.as_str().map(str::parse::<i64>) {
        Some(Ok(id)) => Some(id),
        _ => {
            warn!(field = pascal, value = %raw, "unparseable id, defaulting to 0");
            None
        }
    }
}

fn decode_checked(value: &Value) -> bool {
    match field(value, "Checked", "isChecked") {
        Some(Value::Bool(flag)) => *flag,
        Some(raw) => match raw.as_i64() {
            Some(0) => false,
            Some(1) => true,
            Some(other) => {
                warn!(value = other, "unexpected checked flag, treating as unchecked");
                false
            }
            None => false,
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pascal_and_camel_payloads_decode_identically() {
        let pascal = json!({
            "Id": "42",
            "Name": "Milk",
            "Checked": 1,
            "Amount": "2",
            "Unit": "L",
            "Price": 1.99,
            "Description": "Whole",
            "CategoryId": 3
        });
        let camel = json!({
            "id": 42,
            "name": "Milk",
            "isChecked": true,
            "quantity": "2",
            "unit": "L",
            "price": 1.99,
            "description": "Whole",
            "categoryId": 3
        });

        assert_eq!(decode_item(&pascal), decode_item(&camel));
    }

    #[test]
    fn id_as_number_wins_over_string_id() {
        let item = decode_item(&json!({ "IdAsNumber": 42, "Id": "999", "Name": "Milk" }));
        assert_eq!(item.id, 42);
    }

    #[test]
    fn string_id_is_parsed_and_garbage_defaults_to_zero() {
        assert_eq!(decode_item(&json!({ "Id": "42" })).id, 42);
        assert_eq!(decode_item(&json!({ "Id": "not-a-number" })).id, 0);
        assert_eq!(decode_item(&json!({})).id, 0);
    }

    #[test]
    fn checked_accepts_bools_and_zero_one_integers() {
        assert!(decode_item(&json!({ "Checked": 1 })).is_checked);
        assert!(!decode_item(&json!({ "Checked": 0 })).is_checked);
        assert!(decode_item(&json!({ "isChecked": true })).is_checked);
        assert!(!decode_item(&json!({ "isChecked": false })).is_checked);
        // Anything else degrades to unchecked.
        assert!(!decode_item(&json!({ "Checked": 7 })).is_checked);
        assert!(!decode_item(&json!({})).is_checked);
    }

    #[test]
    fn missing_optional_fields_default() {
        let item = decode_item(&json!({ "Id": "1", "Name": "Milk" }));
        assert!(item.quantity.is_none());
        assert!(item.unit.is_none());
        assert!(item.price.is_none());
        assert!(item.description.is_none());
        assert!(item.category_id.is_none());
    }

    #[test]
    fn archived_flag_truth_table() {
        let decode = |active: Option<i64>, deleted: Option<i64>| {
            let mut payload = json!({ "Id": "1", "Name": "L" });
            if let Some(active) = active {
                payload["Active"] = json!(active);
            }
            if let Some(deleted) = deleted {
                payload["Deleted"] = json!(deleted);
            }
            decode_list(&payload).is_archived
        };

        assert!(!decode(Some(1), Some(0)));
        assert!(decode(Some(0), Some(0)));
        assert!(decode(Some(1), Some(1)));
        assert!(decode(Some(0), Some(1)));
        // Defaults: active, not deleted.
        assert!(!decode(None, None));
        assert!(decode(Some(0), None));
        assert!(decode(None, Some(1)));
    }

    #[test]
    fn list_decodes_nested_items_from_either_casing() {
        let list = decode_list(&json!({
            "Id": "7",
            "Name": "Groceries",
            "Items": [{ "Id": "42", "Name": "Milk", "Checked": 0 }]
        }));
        assert_eq!(list.id, 7);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].name, "Milk");

        let list = decode_list(&json!({
            "id": 7,
            "name": "Groceries",
            "items": [{ "id": 42, "name": "Milk" }]
        }));
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].id, 42);
    }

    #[test]
    fn new_item_serializes_sparse_pascal_case() {
        let body = NewItem { name: "Milk".into(), quantity: Some("2".into()), unit: None };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "Name": "Milk", "Amount": "2" }));

        let body = NewItem { name: "Milk".into(), quantity: None, unit: None };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "Name": "Milk" }));
    }

    #[test]
    fn new_list_serializes_pascal_case() {
        let body = NewList { name: "Trip".into() };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "Name": "Trip" }));
    }
}
