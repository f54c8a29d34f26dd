mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod graceful_shutdown;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{cors, db, imaging, storage, telemetry, utils};

use repositories::sqlx_repo::SqlxMediaRepo;
use use_cases::media::MediaService;

pub struct AppState {
    pub media_service: AppMediaService,
}

pub type AppMediaService = MediaService<SqlxMediaRepo>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        let media_repo = SqlxMediaRepo::new(pool);
        let media_service = MediaService::new(media_repo, config.media.clone());

        AppState { media_service }
    }
}
