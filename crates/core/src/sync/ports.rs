//! Port for shopping-list resource operations.
//!
//! Implemented by the infrastructure API client; the coordinator depends
//! only on this trait so its refresh and mutation logic can be tested
//! without a network.

use async_trait::async_trait;
use listonic_domain::{ItemPatch, Result, ShoppingItem, ShoppingList};

/// CRUD operations against the shopping-list service.
///
/// Every method ensures authentication, retries exactly once after a 401
/// that recovery resolves, and surfaces the error taxonomy from
/// `listonic_domain::SyncError`.
#[async_trait]
pub trait ShoppingListOps: Send + Sync {
    /// Fetch all lists with their items.
    async fn get_lists(&self) -> Result<Vec<ShoppingList>>;

    /// Fetch a single list.
    async fn get_list(&self, list_id: i64) -> Result<ShoppingList>;

    /// Fetch the items of a list.
    async fn get_list_items(&self, list_id: i64) -> Result<Vec<ShoppingItem>>;

    /// Add an item to a list.
    async fn add_item(
        &self,
        list_id: i64,
        name: &str,
        quantity: Option<&str>,
        unit: Option<&str>,
    ) -> Result<ShoppingItem>;

    /// Apply a sparse update to an item. The server answers with an empty
    /// body, so the returned item is reconstructed locally: from `prior`
    /// with the patch applied when prior state is supplied, otherwise a
    /// partial item carrying only the patched fields and the id.
    async fn update_item(
        &self,
        list_id: i64,
        item_id: i64,
        patch: ItemPatch,
        prior: Option<ShoppingItem>,
    ) -> Result<ShoppingItem>;

    /// Delete an item from a list.
    async fn delete_item(&self, list_id: i64, item_id: i64) -> Result<()>;

    /// Create a new list.
    async fn create_list(&self, name: &str) -> Result<ShoppingList>;

    /// Delete a list.
    async fn delete_list(&self, list_id: i64) -> Result<()>;

    /// Mark an item as checked.
    async fn check_item(
        &self,
        list_id: i64,
        item_id: i64,
        prior: Option<ShoppingItem>,
    ) -> Result<ShoppingItem> {
        self.update_item(list_id, item_id, ItemPatch::checked(true), prior).await
    }

    /// Mark an item as unchecked.
    async fn uncheck_item(
        &self,
        list_id: i64,
        item_id: i64,
        prior: Option<ShoppingItem>,
    ) -> Result<ShoppingItem> {
        self.update_item(list_id, item_id, ItemPatch::checked(false), prior).await
    }
}
