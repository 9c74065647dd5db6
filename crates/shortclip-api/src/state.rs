//! Application state.

use std::sync::Arc;

use shortclip_store::{RequestStore, StoreError};

use crate::config::ApiConfig;

/// Shared application state.
///
/// The request store is carried here and handed to each handler through
/// the state extractor, rather than living in process-wide static state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<RequestStore>,
}

impl AppState {
    /// Create new application state, connecting to the database.
    pub async fn new(config: ApiConfig) -> Result<Self, StoreError> {
        let store = RequestStore::connect(&config.database_url).await?;
        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }
}
