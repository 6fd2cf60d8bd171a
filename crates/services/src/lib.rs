#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod sessions;
pub mod settings_service;

pub use quiz_core::Clock;

pub use app_services::{AppServices, StartMode};
pub use error::{AppServicesError, ProgressError, SessionError, SettingsServiceError};
pub use progress_service::ProgressService;
pub use settings_service::{SettingsService, WEIGHT_FIELDS};

pub use sessions::{
    AnswerFeedback, ArcadeOutcome, ArcadeRun, ModeTimings, QuizKind, QuizSession,
    SessionProgress, SpeedAnswer, SpeedRound,
};
