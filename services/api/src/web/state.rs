//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use stackit_core::ports::ForumStore;
use stackit_core::service::{ForumService, ForumSettings};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Used directly only by the identity provider endpoints and middleware;
    /// everything else goes through `forum`.
    pub store: Arc<dyn ForumStore>,
    pub forum: ForumService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn ForumStore>, config: Arc<Config>) -> Self {
        let forum = ForumService::new(
            store.clone(),
            ForumSettings {
                max_vote_attempts: config.vote_max_attempts,
            },
        );
        Self {
            store,
            forum,
            config,
        }
    }
}
