//! Resolve the backend base URL: first candidate that answers a probe wins
//! and is remembered for the next run.

use std::sync::Arc;

use crate::candidates::{BackendEndpoint, CandidateProvider};
use crate::probe::Probe;
use crate::store::{KeyValueStore, WORKING_URL_KEY};
use crate::{Error, Result};

/// Probe `candidates` strictly in order and return the first reachable one.
pub async fn first_reachable<P: Probe + ?Sized>(
    probe: &P,
    candidates: &[BackendEndpoint],
) -> Option<BackendEndpoint> {
    for candidate in candidates {
        log::info!("Attempting to reach backend at: {}", candidate);
        if probe.probe(candidate).await {
            return Some(candidate.clone());
        }
    }
    None
}

/// Owns the persisted "known-good URL" entry. Only a successful resolution
/// writes it.
pub struct ConnectionResolver<P> {
    provider: CandidateProvider,
    probe: P,
    store: Arc<dyn KeyValueStore>,
}

impl<P: Probe> ConnectionResolver<P> {
    pub fn new(provider: CandidateProvider, probe: P, store: Arc<dyn KeyValueStore>) -> Self {
        ConnectionResolver {
            provider,
            probe,
            store,
        }
    }

    /// One pass over the candidate list. Callers wanting a retry call again.
    pub async fn resolve(&self) -> Result<BackendEndpoint> {
        let candidates = self.provider.load(self.store.as_ref()).await;
        self.resolve_from(&candidates).await
    }

    pub async fn resolve_from(&self, candidates: &[BackendEndpoint]) -> Result<BackendEndpoint> {
        let Some(found) = first_reachable(&self.probe, candidates).await else {
            log::info!(
                "Backend not reachable at any of {} candidate URL(s)",
                candidates.len()
            );
            return Err(Error::NoBackendReachable);
        };
        log::info!("Connected to backend URL: {}", found);
        if let Err(e) = self.store.set(WORKING_URL_KEY, found.as_str()).await {
            log::warn!("Error saving working backend URL: {}", e);
        }
        Ok(found)
    }

    pub fn provider(&self) -> &CandidateProvider {
        &self.provider
    }
}
