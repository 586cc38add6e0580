//! Locally installed model catalog.
//!
//! The catalog is an explicitly owned, lazily populated cache of the model
//! names the provider reports. It is created by process-level wiring and
//! passed to whoever needs it; there is no module-level singleton. Call
//! [`ModelCatalog::invalidate`] after installing or removing models.

use crate::client::LlmClient;
use docchat_core::AppResult;
use std::sync::RwLock;

/// Cached listing of installed models.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    names: RwLock<Option<Vec<String>>>,
}

impl ModelCatalog {
    /// Create an empty catalog; the first lookup populates it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the installed model names, querying the provider on first use.
    pub async fn models(&self, client: &dyn LlmClient) -> AppResult<Vec<String>> {
        {
            let cached = self.names.read().expect("catalog lock poisoned");
            if let Some(names) = cached.as_ref() {
                return Ok(names.clone());
            }
        }

        tracing::debug!(
            "Model catalog empty, querying provider '{}'",
            client.provider_name()
        );

        let names = client.list_models().await?;

        let mut cached = self.names.write().expect("catalog lock poisoned");
        *cached = Some(names.clone());

        Ok(names)
    }

    /// Drop the cached listing; the next lookup re-queries the provider.
    pub fn invalidate(&self) {
        let mut cached = self.names.write().expect("catalog lock poisoned");
        *cached = None;
        tracing::debug!("Model catalog invalidated");
    }

    /// Whether a listing is currently cached.
    pub fn is_populated(&self) -> bool {
        self.names.read().expect("catalog lock poisoned").is_some()
    }
}
