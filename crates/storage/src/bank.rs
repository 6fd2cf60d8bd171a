//! Question bank feed: a JSON array of question objects.

use std::path::{Path, PathBuf};

use quiz_core::model::{QuestionBank, QuestionBankError, QuestionDraft, QuestionId};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("cannot read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed question bank: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] QuestionBankError),

    #[error("question bank is empty")]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionFeedItem {
    id: u64,
    question: String,
    correct_answer: String,
    #[serde(default)]
    hint: String,
    #[serde(default)]
    explanation: String,
    multiple_choice_options: Vec<String>,
}

impl From<QuestionFeedItem> for QuestionDraft {
    fn from(item: QuestionFeedItem) -> Self {
        QuestionDraft {
            id: QuestionId::new(item.id),
            prompt: item.question,
            correct_answer: item.correct_answer,
            hint: item.hint,
            explanation: item.explanation,
            options: item.multiple_choice_options,
        }
    }
}

/// Parse and validate a bank from its JSON text.
///
/// # Errors
///
/// Returns `BankLoadError::Json` for malformed input, `BankLoadError::Invalid`
/// when a question fails validation or ids repeat, and `BankLoadError::Empty`
/// for an empty array.
pub fn parse_bank(json: &str) -> Result<QuestionBank, BankLoadError> {
    let items: Vec<QuestionFeedItem> = serde_json::from_str(json)?;
    if items.is_empty() {
        return Err(BankLoadError::Empty);
    }
    let bank = QuestionBank::from_drafts(items.into_iter().map(QuestionDraft::from))?;
    tracing::debug!(questions = bank.len(), "question bank parsed");
    Ok(bank)
}

/// Read a bank from a JSON file.
///
/// # Errors
///
/// Returns `BankLoadError::Io` if the file cannot be read, otherwise the
/// errors of [`parse_bank`].
pub fn load_bank(path: impl AsRef<Path>) -> Result<QuestionBank, BankLoadError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| BankLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bank(&json)
}
