use std::sync::Arc;

use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};

use crate::{
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
    media::{MediaHost, UploadSigner},
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub media: Arc<dyn MediaHost>,
    pub signer: UploadSigner,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, media: Arc<dyn MediaHost>) -> Self {
        let signer = UploadSigner::from_config(&config.cloudinary);
        Self {
            pool,
            config: Arc::new(config),
            media,
            signer,
        }
    }

    /// Checks out a pooled connection. Drop it before awaiting anything.
    pub fn db(&self) -> AppResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
