// Application state module
// Immutable state shared by every connection task

use std::sync::Arc;

use super::types::Config;
use crate::handler::IndexHandler;

/// Application state
///
/// Built once before the accept loop starts and never mutated afterwards,
/// so request handling reads it without locking.
pub struct AppState {
    pub config: Config,
    pub index: Arc<IndexHandler>,
    pub access_log: bool,
}

impl AppState {
    pub fn new(config: &Config, index: IndexHandler) -> Self {
        Self {
            access_log: config.logging.access_log,
            config: config.clone(),
            index: Arc::new(index),
        }
    }
}
