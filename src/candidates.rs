//! Candidate backend URLs, in the order they should be probed.

use std::fmt;

use crate::config::{AppConfig, Platform};
use crate::store::{KeyValueStore, WORKING_URL_KEY};
use crate::{Error, Result};

/// Router, hotspot and loopback addresses a development backend commonly sits behind.
pub const FALLBACK_HOSTS: &[&str] = &[
    "192.168.137.1",
    "192.168.1.2",
    "192.168.1.3",
    "192.168.0.1",
    "192.168.43.1", // Android hotspot
    "172.20.10.1",  // iOS hotspot
    "10.0.2.2",
    "127.0.0.1",
];

/// Base URL of a backend (scheme, host, port). Compared by its string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendEndpoint(String);

impl BackendEndpoint {
    /// Validate `raw` as an http(s) base URL. The text is kept as given apart
    /// from surrounding whitespace and trailing slashes.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let invalid = |reason: &str| Error::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };
        let parsed = url::Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host"));
        }
        Ok(BackendEndpoint(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for a path relative to this base.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.0, path)
        } else {
            format!("{}/{}", self.0, path)
        }
    }
}

impl fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the probe order: saved URL, platform default, configured default,
/// then [`FALLBACK_HOSTS`] on the backend port. Never touches the network.
#[derive(Debug, Clone)]
pub struct CandidateProvider {
    platform: Platform,
    port: u16,
    configured: String,
    fallback_hosts: Vec<String>,
}

impl CandidateProvider {
    pub fn new(platform: Platform, port: u16, configured: impl Into<String>) -> Self {
        CandidateProvider {
            platform,
            port,
            configured: configured.into(),
            fallback_hosts: FALLBACK_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.platform, cfg.backend_port, cfg.backend_url.clone())
    }

    /// Replace the local-network guesses.
    pub fn with_fallback_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn platform_default(&self) -> String {
        format!("http://{}:{}", self.platform.loopback_host(), self.port)
    }

    /// Ordered, de-duplicated candidates. Unparseable entries are skipped.
    pub fn candidates(&self, saved: Option<&str>) -> Vec<BackendEndpoint> {
        let guesses = self
            .fallback_hosts
            .iter()
            .map(|host| format!("http://{}:{}", host, self.port));
        let ordered = saved
            .map(str::to_string)
            .into_iter()
            .chain([self.platform_default(), self.configured.clone()])
            .chain(guesses);

        let mut out: Vec<BackendEndpoint> = Vec::new();
        for raw in ordered {
            match BackendEndpoint::parse(&raw) {
                Ok(ep) if !out.contains(&ep) => out.push(ep),
                Ok(_) => {}
                Err(e) => log::warn!("Skipping candidate backend URL: {}", e),
            }
        }
        out
    }

    /// Candidates with the saved working URL read from `store`. A store
    /// failure just drops the saved entry.
    pub async fn load(&self, store: &dyn KeyValueStore) -> Vec<BackendEndpoint> {
        let saved = match store.get(WORKING_URL_KEY).await {
            Ok(saved) => saved,
            Err(e) => {
                log::warn!("Error retrieving working backend URL: {}", e);
                None
            }
        };
        if let Some(url) = &saved {
            log::debug!("Previously saved backend URL: {}", url);
        }
        self.candidates(saved.as_deref())
    }
}
