//! Application state shared by every handler.

use std::sync::Arc;

use sqlx::PgPool;

use tenderd_core::Config;
use tenderd_db::{FileRepository, ParticipantRepository, TenderRepository, UserRepository};
use tenderd_source::TenderSource;
use tenderd_storage::Storage;

use crate::auth::AuthKeys;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub tenders: TenderRepository,
    pub users: UserRepository,
    pub files: FileRepository,
    pub participants: ParticipantRepository,
    pub storage: Arc<dyn Storage>,
    pub source: Arc<dyn TenderSource>,
    pub auth: AuthKeys,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: PgPool,
        storage: Arc<dyn Storage>,
        source: Arc<dyn TenderSource>,
    ) -> Self {
        let auth = AuthKeys::from_config(&config);
        Self {
            tenders: TenderRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            files: FileRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            pool,
            storage,
            source,
            auth,
            config,
        }
    }
}
