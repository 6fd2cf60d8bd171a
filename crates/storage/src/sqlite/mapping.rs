use quiz_core::model::{PerformanceEntry, QuestionId, SessionStats};
use quiz_core::selection::SelectionWeights;
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization(format!("question_id overflow: {id}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u32_column(row: &sqlx::sqlite::SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_entry_row(row: &sqlx::sqlite::SqliteRow) -> Result<PerformanceEntry, StorageError> {
    let raw_id: i64 = row.try_get("question_id").map_err(ser)?;
    let id = u64::try_from(raw_id)
        .map_err(|_| StorageError::Serialization(format!("invalid question_id: {raw_id}")))?;

    let correct = u32_column(row, "correct_count")?;
    let incorrect = u32_column(row, "incorrect_count")?;
    if correct == 0 && incorrect == 0 {
        return Err(StorageError::Serialization(format!(
            "question {id} stored with no answers"
        )));
    }

    Ok(PerformanceEntry::from_persisted(
        QuestionId::new(id),
        correct,
        incorrect,
        row.try_get("last_seen").map_err(ser)?,
    ))
}

pub(crate) fn map_stats_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionStats, StorageError> {
    Ok(SessionStats::from_persisted(
        u32_column(row, "current_streak")?,
        u32_column(row, "best_streak")?,
        u32_column(row, "total_correct")?,
        u32_column(row, "total_incorrect")?,
    ))
}

pub(crate) fn map_weights_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SelectionWeights, StorageError> {
    SelectionWeights::new(
        row.try_get("unseen_weight").map_err(ser)?,
        row.try_get("base_weight").map_err(ser)?,
        row.try_get("gap_weight").map_err(ser)?,
        row.try_get("min_weight").map_err(ser)?,
        row.try_get("staleness_per_day").map_err(ser)?,
        u32_column(row, "max_staleness_days")?,
    )
    .map_err(ser)
}
