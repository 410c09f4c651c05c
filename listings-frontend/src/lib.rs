pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use config::SessionSettings;
use services::upstream_client::UpstreamClient;
use std::sync::Arc;

/// Shared application state: the upstream client and cookie policy.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub session: Arc<SessionSettings>,
}

impl AppState {
    pub fn new(upstream: Arc<UpstreamClient>, session: SessionSettings) -> Self {
        Self {
            upstream,
            session: Arc::new(session),
        }
    }
}
