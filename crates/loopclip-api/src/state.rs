//! Application state.

use std::sync::Arc;

use loopclip_media::ToolPaths;

use crate::config::ApiConfig;

/// Shared application state. Everything here is read-only per request;
/// no state is shared between pipelines.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub tools: Arc<ToolPaths>,
}

impl AppState {
    pub fn new(config: ApiConfig, tools: ToolPaths) -> Self {
        Self {
            config,
            tools: Arc::new(tools),
        }
    }
}
