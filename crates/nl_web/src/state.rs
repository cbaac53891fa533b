use nl_core::{Error, Result, UserStore};
use nl_inference::Orchestrator;
use std::sync::Arc;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// `None` when no database is configured or reachable.
    pub store: Option<Arc<dyn UserStore>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, store: Option<Arc<dyn UserStore>>) -> Self {
        Self { orchestrator, store }
    }

    pub fn store(&self) -> Result<&dyn UserStore> {
        self.store
            .as_deref()
            .ok_or_else(|| Error::StoreUnavailable("Database not connected".to_string()))
    }
}
