//! # Auth Session
//!
//! Holds the credential for one configuration and turns it into request
//! headers.
//!
//! ```ignore
//! use core_auth::AuthSession;
//! use core_runtime::{Endpoints, SyncConfig};
//!
//! let config = SyncConfig::builder()
//!     .url("https://cms.example.com")
//!     .email_password("editor@example.com", "secret")
//!     .build()?;
//! let endpoints = Endpoints::resolve(&config.url)?;
//! let session = AuthSession::establish(&config, endpoints, http_client).await?;
//!
//! // Re-resolves the token on every call
//! let headers = session.headers().await?;
//! ```

use crate::error::{AuthError, Result};
use crate::types::{AuthToken, TokenResponse};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::{Credentials, HeaderSource, SyncConfig};
use core_runtime::logging::redact_if_sensitive;
use core_runtime::Endpoints;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Refresh tokens this long before they expire
const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(60);

/// Established authentication and endpoint state for one configuration.
pub struct AuthSession {
    endpoints: Endpoints,
    extra_headers: Option<HeaderSource>,
    http_client: Arc<dyn HttpClient>,
    token: RwLock<Option<AuthToken>>,
    /// Serializes refreshes so concurrent callers trigger at most one
    refresh_lock: Mutex<()>,
}

impl AuthSession {
    /// Establish a session for `config`.
    ///
    /// A static token is adopted without any request. An email/password pair
    /// triggers exactly one login exchange. Without credentials the session
    /// is anonymous and a warning is logged.
    #[instrument(skip_all, fields(url = %endpoints.base))]
    pub async fn establish(
        config: &SyncConfig,
        endpoints: Endpoints,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let token = match &config.credentials {
            Credentials::None => {
                warn!(
                    "[directus-sync] No credentials configured; requests to {} are unauthenticated",
                    endpoints.base
                );
                None
            }
            Credentials::Token(token) => {
                info!("Using static access token");
                Some(AuthToken::fixed(token.clone()))
            }
            Credentials::Password { email, password } => {
                Some(login(http_client.as_ref(), &endpoints, email, password).await?)
            }
        };

        Ok(Self {
            endpoints,
            extra_headers: config.headers.clone(),
            http_client,
            token: RwLock::new(token),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Headers for one request: user-supplied extras, then the bearer token.
    pub async fn headers(&self) -> Result<HashMap<String, String>> {
        let mut headers = self
            .extra_headers
            .as_ref()
            .map(HeaderSource::resolve)
            .unwrap_or_default();

        if let Some(token) = self.current_token().await? {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }

        Ok(headers)
    }

    /// Current access token, refreshed first if it is about to expire.
    pub async fn current_token(&self) -> Result<Option<String>> {
        if let Some(fresh) = self.fresh_token().await {
            return Ok(fresh);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(fresh) = self.fresh_token().await {
            return Ok(fresh);
        }

        let refresh_token = {
            let token = self.token.read().await;
            token.as_ref().and_then(|t| t.refresh_token.clone())
        }
        .ok_or_else(|| {
            AuthError::TokenRefreshFailed("token expired and no refresh token was issued".to_string())
        })?;

        let renewed = self.refresh(&refresh_token).await?;
        let access_token = renewed.access_token.clone();
        *self.token.write().await = Some(renewed);

        Ok(Some(access_token))
    }

    /// `Some(token)` when no refresh is due, `None` when one is.
    async fn fresh_token(&self) -> Option<Option<String>> {
        let token = self.token.read().await;
        match token.as_ref() {
            None => Some(None),
            Some(t) if !t.needs_refresh(TOKEN_REFRESH_BUFFER.as_secs() as i64) => {
                Some(Some(t.access_token.clone()))
            }
            Some(_) => None,
        }
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<AuthToken> {
        info!("Access token expiring soon, refreshing");

        let request = HttpRequest::new(HttpMethod::Post, self.endpoints.refresh())
            .json(&serde_json::json!({
                "refresh_token": refresh_token,
                "mode": "json",
            }))
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

        if !response.is_success() {
            return Err(AuthError::TokenRefreshFailed(describe_status(
                &self.endpoints.refresh(),
                &response,
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        debug!(expires_ms = ?parsed.data.expires, "Token refreshed");

        Ok(AuthToken::issued(
            parsed.data.access_token,
            parsed
                .data
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            parsed.data.expires,
        ))
    }
}

#[instrument(skip_all, fields(email = %redact_if_sensitive("email", email)))]
async fn login(
    http_client: &dyn HttpClient,
    endpoints: &Endpoints,
    email: &str,
    password: &str,
) -> Result<AuthToken> {
    let url = endpoints.login();
    debug!(url = %url, "Logging in");

    let request = HttpRequest::new(HttpMethod::Post, url.clone())
        .json(&serde_json::json!({
            "email": email,
            "password": password,
            "mode": "json",
        }))
        .map_err(|e| AuthError::LoginFailed {
            reason: e.to_string(),
        })?;

    let response = http_client
        .execute(request)
        .await
        .map_err(|e| AuthError::LoginFailed {
            reason: e.to_string(),
        })?;

    if !response.is_success() {
        return Err(AuthError::LoginFailed {
            reason: describe_status(&url, &response),
        });
    }

    let parsed: TokenResponse = response.json().map_err(|e| AuthError::LoginFailed {
        reason: format!("unexpected response from {}: {}", url, e),
    })?;

    info!("Logged in");

    Ok(AuthToken::issued(
        parsed.data.access_token,
        parsed.data.refresh_token,
        parsed.data.expires,
    ))
}

fn describe_status(url: &str, response: &HttpResponse) -> String {
    format!(
        "{} returned HTTP {}: {}",
        url,
        response.status,
        response.text_lossy()
    )
}
