use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::IdentityService;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn identity(&self) -> IdentityService {
        IdentityService::new(self.store.clone())
    }
}
