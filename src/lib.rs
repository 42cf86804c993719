//! Mooori admin client core: backend discovery, API client, session and
//! headless screen controllers with sample-data fallback.

pub mod api;
pub mod candidates;
pub mod config;
pub mod credentials;
pub mod diagnostics;
mod error;
pub mod models;
pub mod network;
pub mod probe;
pub mod sample;
pub mod screens;
pub mod session;
pub mod store;

pub use error::{Error, Result};

use std::sync::Arc;

use api::{AdminApi, ApiClient};
use candidates::{BackendEndpoint, CandidateProvider};
use config::{AppConfig, TokenStoreKind};
use network::ConnectionResolver;
use probe::{HttpProbe, Probe};
use screens::{Notice, OrdersScreen, ProductsScreen, ProfileScreen, ReviewsScreen};
use session::{AuthState, Session};
use store::{FileStore, KeyValueStore};

/// Application state shared by every screen: configuration, the single active
/// backend connection (if any) and the session.
pub struct AdminApp {
    config: AppConfig,
    url_store: Arc<dyn KeyValueStore>,
    connection: Option<ApiClient>,
    session: Session,
    notices: Vec<Notice>,
}

impl AdminApp {
    /// Stores as configured: state.json for the working URL, keyring or the
    /// same file for the token.
    pub fn new(config: AppConfig) -> Self {
        let url_store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config::state_path()));
        let token_store: Arc<dyn KeyValueStore> = match config.token_store {
            TokenStoreKind::Keyring => Arc::new(credentials::KeyringStore::new()),
            TokenStoreKind::File => url_store.clone(),
        };
        Self::with_stores(config, url_store, token_store)
    }

    pub fn with_stores(
        config: AppConfig,
        url_store: Arc<dyn KeyValueStore>,
        token_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        AdminApp {
            config,
            url_store,
            connection: None,
            session: Session::new(token_store),
            notices: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn backend_url(&self) -> Option<&BackendEndpoint> {
        self.connection.as_ref().map(|c| c.base_url())
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Resolve the backend and restore the stored session.
    pub async fn start(&mut self) -> Result<()> {
        let probe = HttpProbe::new(self.config.probe_timeout)?;
        self.start_with(probe).await
    }

    pub async fn start_with<P: Probe>(&mut self, probe: P) -> Result<()> {
        self.connect_with(probe).await?;
        let state = self.session.restore(self.connection.as_ref()).await.clone();
        if let AuthState::Authenticated { offline: true, .. } = state {
            self.notices.push(Notice::warning(
                "Offline demo mode enabled",
                "Limited functionality available",
            ));
        }
        Ok(())
    }

    /// One resolution pass. Replaces the active connection; when nothing
    /// answers the app runs on sample data.
    pub async fn connect_with<P: Probe>(&mut self, probe: P) -> Result<Option<&BackendEndpoint>> {
        let resolver = ConnectionResolver::new(
            CandidateProvider::from_config(&self.config),
            probe,
            self.url_store.clone(),
        );
        self.connection = match resolver.resolve().await {
            Ok(base) => Some(ApiClient::new(base, None, self.config.api_timeout)?),
            Err(Error::NoBackendReachable) => {
                self.notices.push(Notice::info(
                    "Using sample data",
                    "App running in offline mode",
                ));
                None
            }
            Err(e) => return Err(e),
        };
        Ok(self.backend_url())
    }

    /// Client for the active backend carrying the session token. The demo
    /// token is never sent.
    pub fn api(&self) -> Result<Option<ApiClient>> {
        let Some(conn) = &self.connection else {
            return Ok(None);
        };
        let token = if self.session.is_offline() {
            None
        } else {
            self.session.token()
        };
        conn.with_token(token).map(Some)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&AuthState> {
        let state = self
            .session
            .login(self.connection.as_ref(), email, password)
            .await?;
        let notice = match state {
            AuthState::Authenticated { offline: true, .. } => Notice::warning(
                "Offline demo mode enabled",
                "Limited functionality available",
            ),
            _ => Notice::success("Login successful"),
        };
        self.notices.push(notice);
        Ok(self.session.state())
    }

    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.notices.push(Notice::success("Logged out successfully"));
    }

    pub async fn refresh_products(&mut self, screen: &mut ProductsScreen) -> Result<()> {
        let api = self.api()?;
        screen.refresh(api.as_ref()).await;
        self.after_screen(screen.state_mut().take_auth_expired()).await;
        Ok(())
    }

    pub async fn refresh_orders(&mut self, screen: &mut OrdersScreen) -> Result<()> {
        let api = self.api()?;
        screen.refresh(api.as_ref()).await;
        self.after_screen(screen.state_mut().take_auth_expired()).await;
        Ok(())
    }

    pub async fn refresh_reviews(&mut self, screen: &mut ReviewsScreen) -> Result<()> {
        let api = self.api()?;
        screen.refresh(api.as_ref()).await;
        self.after_screen(screen.state_mut().take_auth_expired()).await;
        Ok(())
    }

    /// Profile card for the current session.
    pub fn profile(&self, email: impl Into<String>) -> ProfileScreen {
        ProfileScreen::new(email, self.backend_connected())
    }

    /// Run after any controller call; a rejected token ends the session.
    pub async fn after_screen(&mut self, auth_expired: bool) {
        if auth_expired && self.session.is_authenticated() {
            self.session.expire().await;
            self.notices.push(Notice::error(
                "Session expired",
                Some("Please log in again.".to_string()),
            ));
        }
    }
}
