//! One-shot backend reachability check.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use std::time::Duration;

use crate::candidates::BackendEndpoint;
use crate::Result;

/// Paths tried in order; the first 2xx answer wins.
pub const PROBE_PATHS: &[&str] = &["/api/health", "/", "/api/user"];

/// Reachability check against one base URL. Never fails: any error means
/// "not reachable".
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, endpoint: &BackendEndpoint) -> bool;
}

pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    /// `timeout` bounds the whole probe, not each path.
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(HttpProbe { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_paths(&self, endpoint: &BackendEndpoint) -> bool {
        for path in PROBE_PATHS {
            let url = endpoint.join(path);
            log::debug!("Trying endpoint: {}", url);
            match self.client.get(&url).send().await {
                Ok(r) if r.status().is_success() => {
                    log::debug!("Backend check success at {} status: {}", path, r.status());
                    return true;
                }
                Ok(r) => log::debug!("Endpoint {} answered {}", url, r.status()),
                Err(e) => log::debug!("Failed to reach endpoint {}: {}", url, e),
            }
        }
        false
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, endpoint: &BackendEndpoint) -> bool {
        match tokio::time::timeout(self.timeout, self.try_paths(endpoint)).await {
            Ok(true) => true,
            Ok(false) => {
                log::debug!("Backend not reachable at any endpoint of {}", endpoint);
                false
            }
            Err(_) => {
                log::debug!("Probe of {} timed out after {:?}", endpoint, self.timeout);
                false
            }
        }
    }
}
