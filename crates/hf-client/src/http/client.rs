use crate::http::wire::{
    AckResponse, CheckResponse, ListResponse, ListingRequest, LoginResponse, StatusResponse,
};
use crate::{
    ClientError, ClientResult, FavoriteAck, FavoritesAuthority, LoginOutcome, RejectReason,
    SessionAuthority, SessionStatus,
};

use hf_config::ServerConfig;
use hf_core::{Credentials, FavoriteListing, Identity, ListingId, Registration};

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;

const SESSION_STATUS_PATH: &str = "/session/status";
const SESSION_LOGIN_PATH: &str = "/session/login";
const SESSION_REGISTER_PATH: &str = "/session/register";
const SESSION_LOGOUT_PATH: &str = "/session/logout";
const FAVORITES_CHECK_PATH: &str = "/favorites/check";
const FAVORITES_ADD_PATH: &str = "/favorites/add";
const FAVORITES_REMOVE_PATH: &str = "/favorites/remove";
const FAVORITES_LIST_PATH: &str = "/favorites/list";

/// HTTP client for the listing site's session and favorites endpoints.
///
/// Carries the session cookie itself: whatever value the server sets for
/// `cookie_name` is replayed on every later request.
pub struct HttpAuthority {
    pub base_url: String,
    cookie_name: String,
    session_token: RwLock<Option<String>>,
    client: ReqwestClient,
}

impl HttpAuthority {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Site URL (e.g., "http://127.0.0.1:8080")
    /// * `cookie_name` - Name of the session cookie
    /// * `timeout` - Upper bound on every request
    pub fn new(base_url: &str, cookie_name: &str, timeout: Duration) -> ClientResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_name: cookie_name.to_string(),
            session_token: RwLock::new(None),
            client,
        })
    }

    pub fn from_config(config: &ServerConfig) -> ClientResult<Self> {
        Self::new(
            &config.base_url,
            &config.cookie_name,
            config.request_timeout(),
        )
    }

    /// Current session cookie value, if the server has issued one.
    pub fn session_token(&self) -> Option<String> {
        self.session_token
            .read()
            .map(|token| (*token).clone())
            .unwrap_or_default()
    }

    /// Restore a previously persisted session cookie.
    pub fn set_session_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.session_token.write() {
            *guard = token;
        }
    }

    /// Build a request carrying the session cookie
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);

        if let Some(token) = self.session_token() {
            req = req.header(COOKIE, format!("{}={}", self.cookie_name, token));
        }

        req
    }

    /// Execute request, track the session cookie and decode the body
    async fn execute<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ClientResult<T> {
        let response = req.send().await?;
        self.capture_session_cookie(&response);

        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::unauthorized(status.as_u16()));
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
            return Err(ClientError::status(status.as_u16(), message));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    fn capture_session_cookie(&self, response: &Response) {
        for value in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some((name, token)) = raw.split(';').next().and_then(|kv| kv.split_once('='))
            else {
                continue;
            };

            if name.trim() != self.cookie_name {
                continue;
            }

            let token = token.trim();
            // PHP expires a destroyed session by setting it to "deleted"
            if token.is_empty() || token == "deleted" {
                debug!("Server cleared session cookie {}", self.cookie_name);
                self.set_session_token(None);
            } else {
                debug!("Server issued session cookie {}", self.cookie_name);
                self.set_session_token(Some(token.to_string()));
            }
        }
    }

    async fn post_listing<T: DeserializeOwned>(
        &self,
        path: &str,
        listing_id: &ListingId,
    ) -> ClientResult<T> {
        let body = ListingRequest { listing_id };
        let req = self.request(Method::POST, path).json(&body);
        self.execute(req).await
    }

    async fn mutate_favorite(
        &self,
        path: &str,
        listing_id: &ListingId,
    ) -> ClientResult<FavoriteAck> {
        let response = match self.post_listing::<AckResponse>(path, listing_id).await {
            Ok(response) => response,
            Err(ClientError::Unauthorized { status, .. }) => {
                warn!("{path} for listing {listing_id} refused with HTTP {status}");
                return Ok(FavoriteAck::Rejected(RejectReason::NotAuthenticated));
            }
            Err(e) => return Err(e),
        };

        if response.success {
            return Ok(FavoriteAck::Applied);
        }

        if response.is_not_logged_in() {
            return Ok(FavoriteAck::Rejected(RejectReason::NotAuthenticated));
        }

        let message = response
            .message
            .unwrap_or_else(|| String::from("request failed"));
        Ok(FavoriteAck::Rejected(RejectReason::ServerError(message)))
    }

    fn login_outcome(response: LoginResponse, fallback_email: &str) -> ClientResult<LoginOutcome> {
        if !response.success {
            return Ok(LoginOutcome::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| String::from("Login failed")),
            });
        }

        let id = response
            .user_id
            .ok_or_else(|| ClientError::protocol("login succeeded without user_id"))?;

        let email = response
            .email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| fallback_email.trim().to_string());

        Ok(LoginOutcome::Authenticated(Identity {
            id,
            email,
            is_admin: response.is_admin.unwrap_or(false),
            display_name: response.name.filter(|n| !n.trim().is_empty()),
        }))
    }
}

// =========================================================================
// Session Operations
// =========================================================================

#[async_trait]
impl SessionAuthority for HttpAuthority {
    async fn validate_session(&self) -> ClientResult<SessionStatus> {
        let req = self.request(Method::GET, SESSION_STATUS_PATH);
        let response: StatusResponse = self.execute(req).await?;

        Ok(match response.into_identity()? {
            Some(identity) => SessionStatus::LoggedIn(identity),
            None => SessionStatus::LoggedOut,
        })
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome> {
        let req = self
            .request(Method::POST, SESSION_LOGIN_PATH)
            .json(credentials);
        let response: LoginResponse = match self.execute(req).await {
            Err(ClientError::Unauthorized { .. }) => {
                return Ok(LoginOutcome::Rejected {
                    message: String::from("Invalid email or password"),
                });
            }
            other => other?,
        };

        let outcome = Self::login_outcome(response, &credentials.email)?;
        if let LoginOutcome::Authenticated(identity) = &outcome {
            info!("Logged in as user {}", identity.id);
        }
        Ok(outcome)
    }

    async fn register(&self, registration: &Registration) -> ClientResult<LoginOutcome> {
        let req = self
            .request(Method::POST, SESSION_REGISTER_PATH)
            .json(registration);
        let response: LoginResponse = self.execute(req).await?;

        let outcome = Self::login_outcome(response, &registration.email)?;
        if let LoginOutcome::Authenticated(identity) = &outcome {
            info!("Registered user {}", identity.id);
        }
        Ok(outcome)
    }

    async fn logout(&self) -> ClientResult<()> {
        let req = self.request(Method::POST, SESSION_LOGOUT_PATH);
        let response: AckResponse = self.execute(req).await?;

        // The cookie is dead either way
        self.set_session_token(None);

        if response.success {
            Ok(())
        } else {
            Err(ClientError::api(
                response
                    .message
                    .unwrap_or_else(|| String::from("logout failed")),
            ))
        }
    }
}

// =========================================================================
// Favorites Operations
// =========================================================================

#[async_trait]
impl FavoritesAuthority for HttpAuthority {
    async fn is_favorite(&self, listing_id: &ListingId) -> ClientResult<bool> {
        let response: CheckResponse = self
            .post_listing(FAVORITES_CHECK_PATH, listing_id)
            .await?;

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| String::from("check failed"));
            return Err(ClientError::api(message));
        }

        Ok(response.is_favorite.unwrap_or(false))
    }

    async fn add_favorite(&self, listing_id: &ListingId) -> ClientResult<FavoriteAck> {
        self.mutate_favorite(FAVORITES_ADD_PATH, listing_id).await
    }

    async fn remove_favorite(&self, listing_id: &ListingId) -> ClientResult<FavoriteAck> {
        self.mutate_favorite(FAVORITES_REMOVE_PATH, listing_id).await
    }

    async fn list_favorites(&self) -> ClientResult<Vec<FavoriteListing>> {
        let req = self.request(Method::GET, FAVORITES_LIST_PATH);
        let response: ListResponse = self.execute(req).await?;

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| String::from("list failed"));
            return Err(ClientError::api(message));
        }

        Ok(response.favorites)
    }
}
