use crate::{config::Config, db::connection::DbPool, services::revocation::SharedRevocationCache};

/// Shared application state. The revocation cache is injected here, at the
/// composition root, so a distributed implementation can replace the
/// in-process one without touching consumers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub cache: SharedRevocationCache,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config, cache: SharedRevocationCache) -> Self {
        Self {
            pool,
            config,
            cache,
        }
    }
}
