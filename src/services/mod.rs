pub mod auth_service;
pub mod ban_service;
pub mod model_service;
pub mod seed;
pub mod upload_service;

use auth_service::AuthService;
use ban_service::BanService;
use model_service::ModelService;
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};
use upload_service::UploadService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AdminServices {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
    pub auth: AuthService,
    pub bans: BanService,
    pub models: ModelService,
    pub uploads: UploadService,
}

impl AdminServices {
    pub fn new(
        db: Arc<SqlitePool>,
        upload_dir: impl Into<PathBuf>,
        session_timeout_secs: u64,
    ) -> Self {
        Self {
            auth: AuthService::new(db.clone(), session_timeout_secs),
            bans: BanService::new(db.clone()),
            models: ModelService::new(db.clone()),
            uploads: UploadService::new(upload_dir),
            db,
        }
    }
}
