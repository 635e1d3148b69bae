//! Resource operations against the Listonic lists API.
//!
//! Every operation follows the same template: make sure a token exists,
//! issue the request through the rate-limited transport with a bearer
//! header, and on a 401 run session recovery and retry exactly once. The
//! retry cap is a hard bound; a second 401 surfaces as an auth error.

use std::sync::Arc;

use async_trait::async_trait;
use listonic_core::ShoppingListOps;
use listonic_domain::constants::{API_BASE_URL, API_LISTS_ENDPOINT, MAX_AUTH_RETRIES};
use listonic_domain::{ItemPatch, Result, ShoppingItem, ShoppingList, SyncError};
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::wire::{self, NewItem, NewList};
use crate::auth::session::SessionManager;
use crate::http::transport::{RateLimit, Transport};

/// Authenticated client for the Listonic lists API.
pub struct ListonicClient {
    transport: Arc<Transport>,
    session: Arc<SessionManager>,
    base_url: String,
}

impl ListonicClient {
    pub fn new(transport: Arc<Transport>, session: Arc<SessionManager>) -> Self {
        Self::with_base_url(transport, session, API_BASE_URL)
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(
        transport: Arc<Transport>,
        session: Arc<SessionManager>,
        base_url: impl Into<String>,
    ) -> Self {
        Self { transport, session, base_url: base_url.into() }
    }

    fn lists_url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, API_LISTS_ENDPOINT, suffix)
    }

    fn authorized_request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.transport
            .request(method, url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token)
    }

    /// Issue a bearer-authenticated request, recovering from a single 401.
    ///
    /// The builder closure runs once per attempt so a retried request picks
    /// up the token that recovery installed.
    async fn send_authorized<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        self.session.ensure_authenticated().await?;

        for attempt in 0..=MAX_AUTH_RETRIES {
            let token = self
                .session
                .access_token()
                .await
                .ok_or_else(|| SyncError::Auth("no access token held".into()))?;
            let response = self.transport.send(build(&token), RateLimit::Enforce).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                if attempt < MAX_AUTH_RETRIES {
                    debug!("401 received, attempting session recovery");
                    if self.session.recover().await? {
                        continue;
                    }
                }
                return Err(SyncError::Auth("authentication failed after retry".into()));
            }

            return Ok(response);
        }

        Err(SyncError::Auth("authentication failed after retry".into()))
    }

    async fn decode_json(response: Response) -> Result<Value> {
        response.json().await.map_err(|err| SyncError::Connection(err.to_string()))
    }

    /// Fetch all non-archived lists with their items.
    pub async fn get_lists(&self) -> Result<Vec<ShoppingList>> {
        let url = self.lists_url("");
        let response = self
            .send_authorized(|token| {
                self.authorized_request(Method::GET, &url, token).query(&[
                    ("includeShares", "true"),
                    ("archive", "false"),
                    ("includeItems", "true"),
                ])
            })
            .await?;
        let response = ok_or_api_error(response).await?;

        let payload = Self::decode_json(response).await?;
        let lists = payload
            .as_array()
            .map(|lists| lists.iter().map(wire::decode_list).collect::<Vec<_>>())
            .unwrap_or_default();
        debug!(count = lists.len(), "fetched lists");
        Ok(lists)
    }

    pub async fn get_list(&self, list_id: i64) -> Result<ShoppingList> {
        let url = self.lists_url(&format!("/{list_id}"));
        let response = self
            .send_authorized(|token| {
                self.authorized_request(Method::GET, &url, token)
                    .query(&[("includeShares", "true")])
            })
            .await?;
        let response = ok_or_api_error(response).await?;
        Ok(wire::decode_list(&Self::decode_json(response).await?))
    }

    pub async fn get_list_items(&self, list_id: i64) -> Result<Vec<ShoppingItem>> {
        let url = self.lists_url(&format!("/{list_id}/items"));
        let response = self
            .send_authorized(|token| self.authorized_request(Method::GET, &url, token))
            .await?;
        let response = ok_or_api_error(response).await?;

        let payload = Self::decode_json(response).await?;
        Ok(payload
            .as_array()
            .map(|items| items.iter().map(wire::decode_item).collect())
            .unwrap_or_default())
    }

    pub async fn add_item(
        &self,
        list_id: i64,
        name: &str,
        quantity: Option<&str>,
        unit: Option<&str>,
    ) -> Result<ShoppingItem> {
        let url = self.lists_url(&format!("/{list_id}/items"));
        let body = NewItem {
            name: name.to_owned(),
            quantity: quantity.map(str::to_owned),
            unit: unit.map(str::to_owned),
        };
        let response = self
            .send_authorized(|token| {
                self.authorized_request(Method::POST, &url, token).json(&body)
            })
            .await?;
        let response = created_or_api_error(response).await?;

        let item = wire::decode_item(&Self::decode_json(response).await?);
        info!(list_id, item_id = item.id, "added item");
        Ok(item)
    }

    /// Apply a sparse update. The server answers with an empty body, so the
    /// returned item is reconstructed locally: from `prior` with the patch
    /// applied when prior state is known, otherwise a partial item carrying
    /// only the patched fields.
    pub async fn update_item(
        &self,
        list_id: i64,
        item_id: i64,
        patch: ItemPatch,
        prior: Option<ShoppingItem>,
    ) -> Result<ShoppingItem> {
        let url = self.lists_url(&format!("/{list_id}/items/{item_id}"));
        let response = self
            .send_authorized(|token| {
                self.authorized_request(Method::PATCH, &url, token).json(&patch)
            })
            .await?;
        ok_or_api_error(response).await?;

        debug!(list_id, item_id, "updated item");
        Ok(match prior {
            Some(prior) => patch.apply_to(item_id, &prior),
            None => patch.into_partial_item(item_id),
        })
    }

    pub async fn delete_item(&self, list_id: i64, item_id: i64) -> Result<()> {
        let url = self.lists_url(&format!("/{list_id}/items/{item_id}"));
        let response = self
            .send_authorized(|token| self.authorized_request(Method::DELETE, &url, token))
            .await?;
        ok_or_api_error(response).await?;
        info!(list_id, item_id, "deleted item");
        Ok(())
    }

    pub async fn create_list(&self, name: &str) -> Result<ShoppingList> {
        let url = self.lists_url("");
        let body = NewList { name: name.to_owned() };
        let response = self
            .send_authorized(|token| {
                self.authorized_request(Method::POST, &url, token).json(&body)
            })
            .await?;
        let response = created_or_api_error(response).await?;

        let list = wire::decode_list(&Self::decode_json(response).await?);
        info!(list_id = list.id, "created list");
        Ok(list)
    }

    pub async fn delete_list(&self, list_id: i64) -> Result<()> {
        let url = self.lists_url(&format!("/{list_id}"));
        let response = self
            .send_authorized(|token| self.authorized_request(Method::DELETE, &url, token))
            .await?;
        ok_or_api_error(response).await?;
        info!(list_id, "deleted list");
        Ok(())
    }
}

/// Accept 200, otherwise surface status and body as an API error.
async fn ok_or_api_error(response: Response) -> Result<Response> {
    expect_status(response, &[StatusCode::OK]).await
}

/// Creation endpoints answer 200 or 201 depending on the deployment.
async fn created_or_api_error(response: Response) -> Result<Response> {
    expect_status(response, &[StatusCode::OK, StatusCode::CREATED]).await
}

async fn expect_status(response: Response, allowed: &[StatusCode]) -> Result<Response> {
    let status = response.status();
    if allowed.contains(&status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::api(status.as_u16(), body))
}

#[async_trait]
impl ShoppingListOps for ListonicClient {
    async fn get_lists(&self) -> Result<Vec<ShoppingList>> {
        ListonicClient::get_lists(self).await
    }

    async fn get_list(&self, list_id: i64) -> Result<ShoppingList> {
        ListonicClient::get_list(self, list_id).await
    }

    async fn get_list_items(&self, list_id: i64) -> Result<Vec<ShoppingItem>> {
        ListonicClient::get_list_items(self, list_id).await
    }

    async fn add_item(
        &self,
        list_id: i64,
        name: &str,
        quantity: Option<&str>,
        unit: Option<&str>,
    ) -> Result<ShoppingItem> {
        ListonicClient::add_item(self, list_id, name, quantity, unit).await
    }

    async fn update_item(
        &self,
        list_id: i64,
        item_id: i64,
        patch: ItemPatch,
        prior: Option<ShoppingItem>,
    ) -> Result<ShoppingItem> {
        ListonicClient::update_item(self, list_id, item_id, patch, prior).await
    }

    async fn delete_item(&self, list_id: i64, item_id: i64) -> Result<()> {
        ListonicClient::delete_item(self, list_id, item_id).await
    }

    async fn create_list(&self, name: &str) -> Result<ShoppingList> {
        ListonicClient::create_list(self, name).await
    }

    async fn delete_list(&self, list_id: i64) -> Result<()> {
        ListonicClient::delete_list(self, list_id).await
    }
}
