//! Shared types for the HTTP API layer.

use std::sync::Arc;

use crate::core_state::CoreState;

/// Shared context for all API routes.
/// Wraps `CoreState`; handlers open one connection per request.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}
