use nl_core::{Error, Result, UserStore};
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

/// Opens the user store named by `url`:
/// `memory://` for a process-local store, `sqlite:<path>` for SQLite.
pub async fn create_store(url: &str) -> Result<Arc<dyn UserStore>> {
    let url = url.trim();
    let store: Arc<dyn UserStore> = if url.starts_with("memory://") {
        Arc::new(InMemoryStorage::new())
    } else if url.starts_with("sqlite:") {
        sqlite_store(url).await?
    } else {
        return Err(Error::InvalidInput(format!(
            "Unsupported database URL: {}. Use memory:// or sqlite:<path>",
            url
        )));
    };
    info!("💾 Using {} user store", store.name());
    Ok(store)
}

#[cfg(feature = "sqlite")]
async fn sqlite_store(url: &str) -> Result<Arc<dyn UserStore>> {
    Ok(Arc::new(SQLiteStorage::connect(url).await?))
}

#[cfg(not(feature = "sqlite"))]
async fn sqlite_store(_url: &str) -> Result<Arc<dyn UserStore>> {
    Err(Error::InvalidInput(
        "SQLite support is not enabled. Rebuild with --features sqlite".to_string(),
    ))
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_store;
}
