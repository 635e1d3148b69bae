//! Core data types for shopping lists, items, and the coordinator snapshot.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

/// A single shopping list item.
///
/// `id` is server-assigned and stable; it is never reused within a list's
/// lifetime. `is_checked` is the sole authoritative completion flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingItem {
    pub id: i64,
    pub name: String,
    pub is_checked: bool,
    /// Free-text numeric string; the decimal separator is locale-sensitive.
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

impl ShoppingItem {
    /// Create an item with only identity and name set.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_checked: false,
            quantity: None,
            unit: None,
            price: None,
            description: None,
            category_id: None,
        }
    }
}

/// A shopping list with its server-ordered items.
///
/// `is_archived` is recomputed from the wire payload on every decode
/// (inactive OR deleted), never mutated client-side.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingList {
    pub id: i64,
    pub name: String,
    pub items: Vec<ShoppingItem>,
    pub is_archived: bool,
}

impl ShoppingList {
    /// Count of items not yet checked off.
    pub fn unchecked_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_checked).count()
    }

    /// Count of checked-off items.
    pub fn checked_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_checked).count()
    }
}

/// The coordinator's authoritative in-memory copy of all lists.
///
/// Replaced wholesale (not merged) on every successful refresh.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    lists: HashMap<i64, ShoppingList>,
}

impl Snapshot {
    /// Build a snapshot from a freshly fetched list sequence.
    pub fn from_lists(lists: Vec<ShoppingList>) -> Self {
        Self { lists: lists.into_iter().map(|list| (list.id, list)).collect() }
    }

    pub fn get(&self, list_id: i64) -> Option<&ShoppingList> {
        self.lists.get(&list_id)
    }

    /// Look up an item within a list.
    pub fn item(&self, list_id: i64, item_id: i64) -> Option<&ShoppingItem> {
        self.get(list_id).and_then(|list| list.items.iter().find(|item| item.id == item_id))
    }

    pub fn lists(&self) -> impl Iterator<Item = &ShoppingList> {
        self.lists.values()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// A sparse item update: only fields explicitly provided are sent to the
/// server, so an empty-string or unchecked update is never skipped as
/// "not provided".
///
/// Serializes with the wire's PascalCase field names; `Checked` goes out
/// as 1/0 rather than a boolean.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemPatch {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "Checked",
        skip_serializing_if = "Option::is_none",
        serialize_with = "bool_as_int"
    )]
    pub is_checked: Option<bool>,
    #[serde(rename = "Amount", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(rename = "Unit", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ItemPatch {
    /// A patch that only toggles the completion flag.
    pub fn checked(is_checked: bool) -> Self {
        Self { is_checked: Some(is_checked), ..Self::default() }
    }

    /// True when no field was provided.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reconstruct the full item state after a successful update: provided
    /// fields take their new values, everything else keeps the prior value.
    pub fn apply_to(&self, item_id: i64, prior: &ShoppingItem) -> ShoppingItem {
        ShoppingItem {
            id: item_id,
            name: self.name.clone().unwrap_or_else(|| prior.name.clone()),
            is_checked: self.is_checked.unwrap_or(prior.is_checked),
            quantity: self.quantity.clone().or_else(|| prior.quantity.clone()),
            unit: self.unit.clone().or_else(|| prior.unit.clone()),
            price: prior.price,
            description: self.description.clone().or_else(|| prior.description.clone()),
            category_id: prior.category_id,
        }
    }

    /// Best-effort partial item when no prior state was supplied: only the
    /// patched fields and the id are populated.
    pub fn into_partial_item(self, item_id: i64) -> ShoppingItem {
        ShoppingItem {
            id: item_id,
            name: self.name.unwrap_or_default(),
            is_checked: self.is_checked.unwrap_or(false),
            quantity: self.quantity,
            unit: self.unit,
            price: None,
            description: self.description,
            category_id: None,
        }
    }
}

fn bool_as_int<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(flag) => serializer.serialize_u8(u8::from(*flag)),
        None => serializer.serialize_none(),
    }
}
