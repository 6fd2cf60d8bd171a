use std::path::Path;
use std::sync::Arc;

use quiz_core::model::QuestionBank;
use storage::bank::load_bank;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::sessions::ModeTimings;
use crate::settings_service::SettingsService;

/// How saved progress is treated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Continue from the stored progress.
    #[default]
    Resume,
    /// Ignore stored progress; the first checkpoint overwrites it.
    Fresh,
}

/// Assembles the progress handle, settings and mode timings for the app.
pub struct AppServices {
    progress: ProgressService,
    settings: Arc<SettingsService>,
    timings: ModeTimings,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and a JSON question bank.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the bank cannot be loaded, storage
    /// initialization fails, or saved settings/progress cannot be read.
    pub async fn new_sqlite(
        db_url: &str,
        bank_path: &Path,
        clock: Clock,
        start: StartMode,
    ) -> Result<Self, AppServicesError> {
        let bank = Arc::new(load_bank(bank_path)?);
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, bank, clock, start).await
    }

    /// Build services over an existing storage aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if saved settings or progress cannot be read.
    pub async fn from_storage(
        storage: Storage,
        bank: Arc<QuestionBank>,
        clock: Clock,
        start: StartMode,
    ) -> Result<Self, AppServicesError> {
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));
        let weights = settings.load().await?;

        let progress = match start {
            StartMode::Resume => {
                ProgressService::load(Arc::clone(&storage.progress), bank, weights, clock).await?
            }
            StartMode::Fresh => {
                ProgressService::fresh(Arc::clone(&storage.progress), bank, weights, clock)
            }
        };

        Ok(Self {
            progress,
            settings,
            timings: ModeTimings::default(),
        })
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressService {
        &mut self.progress
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn timings(&self) -> ModeTimings {
        self.timings
    }

    /// Final checkpoint of the progress handle.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Progress` if the save fails.
    pub async fn shutdown(self) -> Result<(), AppServicesError> {
        self.progress.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress_service::tests::bank;
    use quiz_core::model::QuestionId;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn saved_weights_reach_the_progress_handle() {
        let repo = InMemoryRepository::new();
        let storage = Storage::from_in_memory(repo.clone());
        SettingsService::new(Arc::clone(&storage.settings))
            .set_field("unseen_weight", "12")
            .await
            .unwrap();

        let services = AppServices::from_storage(
            storage,
            bank(3),
            Clock::fixed(fixed_now()),
            StartMode::Resume,
        )
        .await
        .unwrap();
        assert!((services.progress().weights().unseen_weight() - 12.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn fresh_start_ignores_saved_progress() {
        let repo = InMemoryRepository::new();
        let mut services = AppServices::from_storage(
            Storage::from_in_memory(repo.clone()),
            bank(3),
            Clock::fixed(fixed_now()),
            StartMode::Resume,
        )
        .await
        .unwrap();
        services
            .progress_mut()
            .record_answer(QuestionId::new(1), true)
            .await
            .unwrap();
        services.shutdown().await.unwrap();

        let resumed = AppServices::from_storage(
            Storage::from_in_memory(repo.clone()),
            bank(3),
            Clock::fixed(fixed_now()),
            StartMode::Resume,
        )
        .await
        .unwrap();
        assert_eq!(resumed.progress().ledger().len(), 1);

        let fresh = AppServices::from_storage(
            Storage::from_in_memory(repo),
            bank(3),
            Clock::fixed(fixed_now()),
            StartMode::Fresh,
        )
        .await
        .unwrap();
        assert!(fresh.progress().ledger().is_empty());
    }
}
