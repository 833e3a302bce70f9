//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{BlobStore, LocalStoreAdapter};
use crate::config::Config;
use std::sync::Arc;
use study_planner_core::ports::{Clock, SessionStore, TopicStore};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub topics: Arc<dyn TopicStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires both stores to the same blob backend.
    pub fn with_blob_store(
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        config: Arc<Config>,
    ) -> Self {
        let store = Arc::new(LocalStoreAdapter::new(blobs));
        Self {
            topics: store.clone(),
            sessions: store,
            clock,
            config,
        }
    }
}
