//! Keyring-backed storage for the session token.

use async_trait::async_trait;

use crate::store::KeyValueStore;
use crate::Result;

const SERVICE_NAME: &str = "MoooriAdmin";

fn service_name() -> &'static str {
    if crate::config::config_dir_overridden() {
        "MoooriAdmin-E2E"
    } else {
        SERVICE_NAME
    }
}

/// OS keyring entries under one service, one entry per key.
pub struct KeyringStore {
    service: &'static str,
}

impl KeyringStore {
    pub fn new() -> Self {
        KeyringStore {
            service: service_name(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(self.service, key)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(v) if !v.is_empty() => Ok(Some(v)),
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
