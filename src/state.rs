use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::session::SessionCodec;
use crate::config::Config;
use crate::db::repository::{DynPostRepository, DynUserRepository, SqliteRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionCodec>,
    pub users: DynUserRepository,
    pub posts: DynPostRepository,
}

impl AppState {
    /// Wire the SQLite-backed repositories and the session codec around a
    /// fully loaded config.
    pub fn new(config: Config, pool: DbPool) -> Self {
        let repository = Arc::new(SqliteRepository::new(pool));
        let sessions = SessionCodec::new(config.jwt_secret(), config.auth.session_hours);

        Self {
            config,
            sessions: Arc::new(sessions),
            users: repository.clone(),
            posts: repository,
        }
    }
}
