use std::sync::Arc;

use atelier::llm::ChatClient;
use atelier::session::SessionStore;

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub store: SessionStore,
    pub client: Arc<dyn ChatClient>,
}

impl AppState {
    pub fn new(config: Config, store: SessionStore, client: Arc<dyn ChatClient>) -> Self {
        Self {
            config,
            store,
            client,
        }
    }
}
