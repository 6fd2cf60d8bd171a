//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{CountdownError, QuestionId};
use quiz_core::selection::SelectionWeightsError;
use storage::bank::BankLoadError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("answer recorded for question {0}, which is not in the bank")]
    UnknownQuestion(QuestionId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by mode sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this mode")]
    NoMaterial,
    #[error("session already completed")]
    Completed,
    #[error("current question was already answered")]
    AlreadyAnswered,
    #[error("current question has not been answered yet")]
    NotAnswered,
    #[error("option {index} is out of range ({len} options)")]
    InvalidOption { index: usize, len: usize },
    #[error("this action is not available in {0} mode")]
    WrongMode(&'static str),
    #[error("flip the card before grading it")]
    NotFlipped,
    #[error("the round is not running")]
    NotRunning,
    #[error(transparent)]
    Countdown(#[from] CountdownError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error("unknown weight field `{0}`")]
    UnknownField(String),
    #[error("invalid value `{value}` for {field}")]
    InvalidValue { field: &'static str, value: String },
    #[error(transparent)]
    Weights(#[from] SelectionWeightsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Bank(#[from] BankLoadError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
