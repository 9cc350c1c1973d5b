use std::sync::Arc;

use storage::import::{ImportReport, import_seed};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::pool::PoolManager;
use crate::sessions::ListeningSessionService;
use crate::speech::SpeechOutput;

/// Assembles host-facing services over one storage backend and one shared
/// question pool.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    pool: Arc<PoolManager>,
    sessions: Arc<ListeningSessionService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: Storage, clock: Clock, speech: Arc<dyn SpeechOutput>) -> Self {
        let pool = Arc::new(PoolManager::new());
        let sessions = ListeningSessionService::new(
            clock,
            Arc::clone(&pool),
            Arc::clone(&storage.content),
            Arc::clone(&storage.progression),
            Arc::clone(&storage.session_results),
        )
        .with_speech(speech);

        Self {
            storage,
            pool,
            sessions: Arc::new(sessions),
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        speech: Arc<dyn SpeechOutput>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(storage, clock, speech))
    }

    /// Services over in-memory storage, for tests and demos.
    #[must_use]
    pub fn in_memory(clock: Clock, speech: Arc<dyn SpeechOutput>) -> Self {
        Self::new(Storage::in_memory(), clock, speech)
    }

    /// Import the bundled questions unless content already exists.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Import` if the seed cannot be read or stored.
    pub async fn ensure_seeded(&self) -> Result<ImportReport, AppServicesError> {
        Ok(import_seed(&self.storage, None, false).await?)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn pool(&self) -> Arc<PoolManager> {
        Arc::clone(&self.pool)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<ListeningSessionService> {
        Arc::clone(&self.sessions)
    }
}
