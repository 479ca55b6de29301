use std::sync::Arc;

use tracing::error;
use yatube_db::Repository;

use crate::cache::PageCache;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub repo: Arc<dyn Repository>,
    pub jwt_secret: String,
    /// Posts per page on every listing.
    pub page_size: usize,
    pub index_cache: PageCache,
}

/// Run a repository call on the blocking pool.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn Repository) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let repo = state.repo.clone();
    tokio::task::spawn_blocking(move || f(repo.as_ref()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::from)
}
