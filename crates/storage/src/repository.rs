use async_trait::async_trait;
use quiz_core::model::{PerformanceLedger, SessionStats};
use quiz_core::selection::SelectionWeights;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Everything the progress handle persists: the ledger plus the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub ledger: PerformanceLedger,
    pub stats: SessionStats,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(ledger: PerformanceLedger, stats: SessionStats) -> Self {
        Self { ledger, stats }
    }
}

/// Repository contract for learner progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the last saved progress. An empty store yields an empty record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or holds rows that
    /// do not map back onto domain values.
    async fn load(&self) -> Result<ProgressRecord, StorageError>;

    /// Replace the stored progress with `ledger` and `stats`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails. Nothing is partially
    /// written.
    async fn save(&self, ledger: &PerformanceLedger, stats: &SessionStats)
    -> Result<(), StorageError>;

    /// Forget all stored progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Repository contract for the selection weighting curve.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch the saved weights, if any were ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures or invalid stored values.
    async fn get_weights(&self) -> Result<Option<SelectionWeights>, StorageError>;

    /// Persist the weights, replacing any previous ones.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the weights cannot be stored.
    async fn save_weights(&self, weights: &SelectionWeights) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<ProgressRecord>>,
    weights: Arc<Mutex<Option<SelectionWeights>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already-saved progress.
    #[must_use]
    pub fn with_progress(record: ProgressRecord) -> Self {
        Self {
            progress: Arc::new(Mutex::new(record)),
            weights: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn load(&self) -> Result<ProgressRecord, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save(
        &self,
        ledger: &PerformanceLedger,
        stats: &SessionStats,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = ProgressRecord::new(ledger.clone(), *stats);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = ProgressRecord::default();
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_weights(&self) -> Result<Option<SelectionWeights>, StorageError> {
        let guard = self
            .weights
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_weights(&self, weights: &SelectionWeights) -> Result<(), StorageError> {
        let mut guard = self
            .weights
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(*weights);
        Ok(())
    }
}

/// Aggregates progress and settings repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressStore>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository, keeping a handle for inspection.
    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let progress: Arc<dyn ProgressStore> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Self { progress, settings }
    }
}
