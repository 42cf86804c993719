//! Session token lifecycle: login, startup restore, logout.

use std::sync::Arc;

use crate::api::AdminApi;
use crate::store::{KeyValueStore, TOKEN_KEY};
use crate::{Error, Result};

/// Token handed out when logging in with the demo pair and no backend.
pub const DEMO_TOKEN: &str = "demo-token-offline-mode";
pub const DEMO_EMAIL: &str = "admin@gmail.com";
pub const DEMO_PASSWORD: &str = "123456789";

const TOKEN_PREVIEW_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// `offline` is set for the demo token, which the backend never issued.
    Authenticated { token: String, offline: bool },
}

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    state: AuthState,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Session {
            store,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            AuthState::Authenticated { token, .. } => Some(token),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { offline: true, .. })
    }

    /// First 20 characters followed by `...`.
    pub fn token_preview(&self) -> Option<String> {
        self.token()
            .map(|t| crate::models::truncate(t, TOKEN_PREVIEW_CHARS))
    }

    /// Log in against `api`, or with the demo pair when there is no backend.
    ///
    /// Without a backend no request is made: the demo pair yields
    /// [`DEMO_TOKEN`], anything else is [`Error::InvalidCredentials`].
    pub async fn login<A: AdminApi + ?Sized>(
        &mut self,
        api: Option<&A>,
        email: &str,
        password: &str,
    ) -> Result<&AuthState> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::MissingCredentials);
        }
        let Some(api) = api else {
            if email.trim() != DEMO_EMAIL || password != DEMO_PASSWORD {
                return Err(Error::InvalidCredentials);
            }
            log::info!("Backend unavailable, entering offline demo mode");
            self.adopt(DEMO_TOKEN.to_string(), true).await;
            return Ok(&self.state);
        };

        log::debug!("Attempting login to {} as {}", api.base_url(), email);
        let data = api.login(email.trim(), password).await?.into_result("Login failed")?;
        let token = data
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::api(None, "Login failed"))?;
        self.adopt(token, false).await;
        Ok(&self.state)
    }

    /// Load the stored token and decide whether to keep it.
    ///
    /// The demo token is kept as is. Without a backend a stored token is kept
    /// unvalidated. With one, `api` is re-bound to the stored token and asked
    /// to check it. Only an explicit rejection (`success: false`, 401/403 or
    /// "Not Authorized") clears the token; any other failure keeps it.
    pub async fn restore<A: AdminApi>(&mut self, api: Option<&A>) -> &AuthState {
        let stored = match self.store.get(TOKEN_KEY).await {
            Ok(Some(t)) if !t.is_empty() => t,
            Ok(_) => {
                log::debug!("No stored token found");
                self.state = AuthState::Unauthenticated;
                return &self.state;
            }
            Err(e) => {
                log::warn!("Error retrieving token: {}", e);
                self.state = AuthState::Unauthenticated;
                return &self.state;
            }
        };

        if stored == DEMO_TOKEN {
            log::info!("Using offline demo token");
            self.state = AuthState::Authenticated {
                token: stored,
                offline: true,
            };
            return &self.state;
        }

        let Some(api) = api else {
            self.state = AuthState::Authenticated {
                token: stored,
                offline: false,
            };
            return &self.state;
        };

        let valid = match api.with_token(Some(&stored)) {
            Ok(authed) => token_accepted(&authed).await,
            Err(e) => {
                log::info!("Stored token cannot be sent: {}", e);
                false
            }
        };
        if valid {
            self.state = AuthState::Authenticated {
                token: stored,
                offline: false,
            };
        } else {
            log::info!("Stored token is no longer valid, removing");
            self.logout().await;
        }
        &self.state
    }

    /// Forget the token locally and in the store.
    pub async fn logout(&mut self) {
        self.state = AuthState::Unauthenticated;
        if let Err(e) = self.store.remove(TOKEN_KEY).await {
            log::warn!("Error removing stored token: {}", e);
        }
    }

    /// The backend rejected the token mid-session.
    pub async fn expire(&mut self) {
        if self.is_authenticated() {
            log::info!("Session token rejected by backend, logging out");
            self.logout().await;
        }
    }

    async fn adopt(&mut self, token: String, offline: bool) {
        if let Err(e) = self.store.set(TOKEN_KEY, &token).await {
            log::warn!("Error saving token: {}", e);
        }
        self.state = AuthState::Authenticated { token, offline };
    }
}

/// False only when the backend explicitly refuses the token.
async fn token_accepted<A: AdminApi>(api: &A) -> bool {
    match api.validate_token().await {
        Ok(resp) if resp.success => true,
        Ok(resp) => {
            log::info!(
                "Token validation refused: {}",
                resp.message.as_deref().unwrap_or("no message")
            );
            false
        }
        Err(e) if e.is_auth() => {
            log::info!("Token validation refused: {}", e);
            false
        }
        Err(e) => {
            log::info!("Token validation inconclusive, keeping token: {}", e);
            true
        }
    }
}
