use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::db::database::Database;
use crate::llm::ModelClient;
use crate::pipeline::session::SessionStore;
use crate::storage::CardImageStore;

/// Feature availability derived from what was constructed at startup.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capabilities {
    #[serde(rename = "aiEnabled")]
    pub ai_enabled: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub images: CardImageStore,
    pub sessions: Arc<SessionStore>,
    model: Option<Arc<dyn ModelClient>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        db: Database,
        images: CardImageStore,
        model: Option<Arc<dyn ModelClient>>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(
            config.portrait_session_ttl_seconds,
        )));
        AppState {
            db,
            images,
            sessions,
            model,
        }
    }

    /// Per-request probe: reports whether the provider client exists. No
    /// network round-trip, safe to call on every request.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            ai_enabled: self.model.is_some(),
        }
    }

    pub fn model(&self) -> Option<&dyn ModelClient> {
        self.model.as_deref()
    }

    pub fn model_handle(&self) -> Option<Arc<dyn ModelClient>> {
        self.model.clone()
    }
}
