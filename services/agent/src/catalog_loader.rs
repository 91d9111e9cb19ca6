//! Voice Catalog Loader
//!
//! Fetches the provider's voice listing once per worker process. Any failure
//! degrades to an empty catalog: sessions then simply cannot switch voices.

use crate::config::VoiceProviderConfig;
use cadence_core::{Voice, VoiceCatalog};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("voice provider responded with {0}")]
    Status(StatusCode),
    #[error("voice provider request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct CatalogLoader {
    client: reqwest::Client,
    provider: VoiceProviderConfig,
}

impl CatalogLoader {
    pub fn new(provider: VoiceProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider,
        }
    }

    /// Loads the catalog, falling back to an empty one on any failure.
    pub async fn load(&self) -> VoiceCatalog {
        match self.fetch().await {
            Ok(voices) => {
                let catalog = VoiceCatalog::new(voices);
                info!(voices = catalog.len(), "Loaded voice catalog");
                catalog
            }
            Err(e) => {
                warn!(error = %e, url = %self.provider.voices_url, "Failed to fetch voices; voice switching disabled");
                VoiceCatalog::empty()
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Voice>, CatalogError> {
        let response = self
            .client
            .get(&self.provider.voices_url)
            .header("X-API-Key", &self.provider.api_key)
            .header("Cartesia-Version", &self.provider.api_version)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogError::Status(status));
        }
        Ok(response.json::<Vec<Voice>>().await?)
    }
}
