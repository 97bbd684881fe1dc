use std::sync::Arc;

use storage::repository::Storage;
use tutor_core::model::{CourseId, LessonId, Locale};

use crate::Clock;
use crate::catalog::{CatalogProvider, GeneratedCatalog};
use crate::chat::{ChatConfig, ChatTutorService};
use crate::error::AppServicesError;
use crate::lesson::{LessonView, SilentEngine, SpeechEngine};
use crate::progress_store::ProgressStore;

/// Assembles the progress store, the tutor client and the speech engine.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    store: Arc<ProgressStore>,
    tutor: Arc<ChatTutorService>,
    speech: Arc<dyn SpeechEngine>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the catalog fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        locale: Locale,
        chat: ChatConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        tracing::info!(db_url, %locale, "opened sqlite storage");
        Self::from_storage(storage, clock, locale, chat).await
    }

    /// Build services that keep the snapshot in memory only.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog cannot be built.
    pub async fn in_memory(clock: Clock, locale: Locale, chat: ChatConfig) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), clock, locale, chat).await
    }

    async fn from_storage(
        storage: Storage,
        clock: Clock,
        locale: Locale,
        chat: ChatConfig,
    ) -> Result<Self, AppServicesError> {
        let catalog: Arc<dyn CatalogProvider> = Arc::new(GeneratedCatalog::new());
        let store = ProgressStore::open(clock, catalog, Arc::clone(&storage.snapshots), locale).await?;

        Ok(Self {
            clock,
            store: Arc::new(store),
            tutor: Arc::new(ChatTutorService::new(chat)),
            speech: Arc::new(SilentEngine),
        })
    }

    /// Replace the speech engine used by lesson views opened afterwards.
    #[must_use]
    pub fn with_speech_engine(mut self, engine: Arc<dyn SpeechEngine>) -> Self {
        self.speech = engine;
        self
    }

    #[must_use]
    pub fn store(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<ChatTutorService> {
        Arc::clone(&self.tutor)
    }

    /// Opens a lesson in the current locale and marks its course active.
    ///
    /// Returns `None` if the lesson is not in the catalog.
    pub async fn open_lesson(&self, course_id: &CourseId, lesson_id: &LessonId) -> Option<LessonView> {
        let lesson = self.store.lesson(course_id, lesson_id)?;
        self.store.set_active_course(course_id.clone()).await;
        Some(LessonView::new(
            lesson,
            Arc::clone(&self.speech),
            Arc::clone(&self.tutor),
            self.clock,
            self.store.locale(),
        ))
    }
}
