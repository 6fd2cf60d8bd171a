#![forbid(unsafe_code)]

pub mod bank;
pub mod repository;
pub mod sqlite;

pub use bank::{BankLoadError, load_bank, parse_bank};
pub use repository::{
    InMemoryRepository, ProgressRecord, ProgressStore, SettingsRepository, Storage, StorageError,
};
