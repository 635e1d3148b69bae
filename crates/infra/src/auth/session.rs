//! Session manager: password login, token refresh, and 401 recovery.
//!
//! The Listonic login endpoint speaks an OAuth2-style dialect: password
//! grants and refresh grants both go to `/api/loginextended` as form posts,
//! authenticated at the application level by a static `clientauthorization`
//! header. Token traffic bypasses the transport's rate gate so recovery can
//! proceed while resource requests are queued, but keeps its backoff loop.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use listonic_domain::constants::{
    API_BASE_URL, API_LOGIN_ENDPOINT, CLIENT_ID, CLIENT_SECRET, REDIRECT_URI,
};
use listonic_domain::{Result, SyncConfig, SyncError};
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::http::transport::{RateLimit, Transport};

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Holds account credentials and the current token pair.
pub struct SessionManager {
    transport: Arc<Transport>,
    base_url: String,
    email: String,
    password: String,
    /// Precomputed `Bearer base64(client_id:client_secret)` header value.
    client_auth: String,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(transport: Arc<Transport>, config: &SyncConfig) -> Self {
        Self::with_base_url(transport, config, API_BASE_URL)
    }

    /// Point the session at a different endpoint (tests).
    pub fn with_base_url(
        transport: Arc<Transport>,
        config: &SyncConfig,
        base_url: impl Into<String>,
    ) -> Self {
        let client_auth =
            format!("Bearer {}", BASE64.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")));
        Self {
            transport,
            base_url: base_url.into(),
            email: config.email.clone(),
            password: config.password.clone(),
            client_auth,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    /// Authenticate if no access token is held yet.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.state.read().await.access_token.is_none() {
            self.authenticate().await?;
        }
        Ok(())
    }

    /// Full password-grant login. Replaces the stored token pair.
    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, API_LOGIN_ENDPOINT);
        let builder = self
            .transport
            .request(Method::POST, &url)
            .query(&[("provider", "password"), ("autoMerge", "1"), ("autoDestruct", "1")])
            .header(ACCEPT, "application/json")
            .header("clientauthorization", &self.client_auth)
            .form(&[
                ("username", self.email.as_str()),
                ("password", self.password.as_str()),
                ("client_id", CLIENT_ID),
                ("client_secret", CLIENT_SECRET),
                ("redirect_uri", REDIRECT_URI),
            ]);

        let response = self.transport.send(builder, RateLimit::Bypass).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Auth("invalid credentials".into()));
        }
        if status == StatusCode::BAD_REQUEST {
            let text = read_body(response).await?;
            // The service reports credential problems as 400 with an
            // auth-flavored message.
            if text.contains("Unauthorized") || text.contains("Invalid") {
                return Err(SyncError::Auth(format!("invalid credentials: {text}")));
            }
            return Err(SyncError::api(400, text));
        }
        if status != StatusCode::OK {
            let text = read_body(response).await?;
            return Err(SyncError::api(status.as_u16(), text));
        }

        let tokens: TokenResponse =
            response.json().await.map_err(|err| SyncError::Connection(err.to_string()))?;
        let Some(access_token) = tokens.access_token else {
            return Err(SyncError::Auth("no access token in login response".into()));
        };

        let mut state = self.state.write().await;
        state.access_token = Some(access_token);
        state.refresh_token = tokens.refresh_token;
        debug!("authenticated with Listonic");
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns `Ok(false)` when refresh cannot help (no refresh token, the
    /// grant was rejected, or the network dropped the call) so the caller
    /// falls back to a full login. A rejected grant invalidates the stored
    /// refresh token.
    pub async fn refresh(&self) -> Result<bool> {
        let Some(refresh_token) = self.state.read().await.refresh_token.clone() else {
            debug!("no refresh token available, full auth required");
            return Ok(false);
        };

        let url = format!("{}{}", self.base_url, API_LOGIN_ENDPOINT);
        let builder = self
            .transport
            .request(Method::POST, &url)
            .header(ACCEPT, "application/json")
            .header("clientauthorization", &self.client_auth)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", CLIENT_ID),
                ("client_secret", CLIENT_SECRET),
            ]);

        let response = match self.transport.send(builder, RateLimit::Bypass).await {
            Ok(response) => response,
            Err(SyncError::Connection(msg)) => {
                debug!(error = %msg, "token refresh failed, full auth required");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "token refresh rejected, full auth required");
            self.state.write().await.refresh_token = None;
            return Ok(false);
        }

        let tokens: TokenResponse =
            response.json().await.map_err(|err| SyncError::Connection(err.to_string()))?;
        let Some(access_token) = tokens.access_token else {
            debug!("no access token in refresh response");
            return Ok(false);
        };

        let mut state = self.state.write().await;
        state.access_token = Some(access_token);
        if tokens.refresh_token.is_some() {
            state.refresh_token = tokens.refresh_token;
        }
        debug!("refreshed access token");
        Ok(true)
    }

    /// Recover from a 401: drop the access token, try a refresh, fall back
    /// to a full login. Returns whether a usable token now exists; a
    /// rejected login yields `Ok(false)` while transport and service
    /// failures propagate.
    pub async fn recover(&self) -> Result<bool> {
        self.state.write().await.access_token = None;

        if self.refresh().await? {
            return Ok(true);
        }

        match self.authenticate().await {
            Ok(()) => Ok(true),
            Err(err) if err.is_auth() => {
                warn!(error = %err, "re-authentication rejected");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(test)]
    pub(crate) async fn seed_tokens(&self, access: Option<&str>, refresh: Option<&str>) {
        let mut state = self.state.write().await;
        state.access_token = access.map(str::to_owned);
        state.refresh_token = refresh.map(str::to_owned);
    }
}

async fn read_body(response: reqwest::Response) -> Result<String> {
    response.text().await.map_err(|err| SyncError::Connection(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config() -> SyncConfig {
        SyncConfig::new("user@example.com", "hunter2", 30).unwrap()
    }

    fn transport() -> Arc<Transport> {
        Arc::new(
            Transport::builder()
                .initial_backoff(Duration::from_millis(10))
                .min_interval(Duration::from_millis(0))
                .build()
                .unwrap(),
        )
    }

    fn session(server: &MockServer) -> SessionManager {
        SessionManager::with_base_url(transport(), &config(), server.uri())
    }

    fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
        match refresh {
            Some(refresh) => {
                serde_json::json!({ "access_token": access, "refresh_token": refresh })
            }
            None => serde_json::json!({ "access_token": access }),
        }
    }

    #[tokio::test]
    async fn authenticate_sends_password_grant_and_stores_tokens() {
        let server = MockServer::start().await;
        let expected_auth =
            format!("Bearer {}", BASE64.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")));
        Mock::given(method("POST"))
            .and(path(API_LOGIN_ENDPOINT))
            .and(query_param("provider", "password"))
            .and(query_param("autoMerge", "1"))
            .and(query_param("autoDestruct", "1"))
            .and(header("clientauthorization", expected_auth.as_str()))
            .and(body_string_contains("username=user%40example.com"))
            .and(body_string_contains("password=hunter2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("tok-1", Some("ref-1"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server);
        session.authenticate().await.unwrap();
        assert_eq!(session.access_token().await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn authenticate_maps_401_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = session(&server).authenticate().await.unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
    }

    #[tokio::test]
    async fn authenticate_maps_auth_flavored_400_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid grant"))
            .mount(&server)
            .await;

        let err = session(&server).authenticate().await.unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
    }

    #[tokio::test]
    async fn authenticate_maps_other_400_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("missing field"))
            .mount(&server)
            .await;

        let err = session(&server).authenticate().await.unwrap_err();
        assert!(matches!(err, SyncError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn authenticate_without_token_in_body_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = session(&server).authenticate().await.unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
    }

    #[tokio::test]
    async fn refresh_without_stored_token_returns_false() {
        let server = MockServer::start().await;
        let session = session(&server);
        assert!(!session.refresh().await.unwrap());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_refresh_invalidates_the_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server);
        session.seed_tokens(Some("stale"), Some("ref-1")).await;

        assert!(!session.refresh().await.unwrap());
        // The second call short-circuits without a request.
        assert!(!session.refresh().await.unwrap());
    }

    #[tokio::test]
    async fn refresh_rotates_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=ref-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("tok-2", Some("ref-2"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server);
        session.seed_tokens(Some("tok-1"), Some("ref-1")).await;

        assert!(session.refresh().await.unwrap());
        assert_eq!(session.access_token().await.as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn recover_prefers_refresh_over_full_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2", None)))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server);
        session.seed_tokens(Some("expired"), Some("ref-1")).await;

        assert!(session.recover().await.unwrap());
        assert_eq!(session.access_token().await.as_deref(), Some("tok-2"));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recover_falls_back_to_full_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("provider", "password"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("tok-3", Some("ref-3"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server);
        session.seed_tokens(Some("expired"), Some("ref-1")).await;

        assert!(session.recover().await.unwrap());
        assert_eq!(session.access_token().await.as_deref(), Some("tok-3"));
    }

    #[tokio::test]
    async fn recover_reports_rejected_credentials_as_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let session = session(&server);
        session.seed_tokens(Some("expired"), None).await;

        assert!(!session.recover().await.unwrap());
        assert!(session.access_token().await.is_none());
    }
}
