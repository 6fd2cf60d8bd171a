use async_trait::async_trait;
use quiz_core::model::{PerformanceLedger, SessionStats};

use crate::repository::{ProgressRecord, ProgressStore, StorageError};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_entry_row, map_stats_row};

#[async_trait]
impl ProgressStore for SqliteRepository {
    async fn load(&self) -> Result<ProgressRecord, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id, correct_count, incorrect_count, last_seen
            FROM question_performance
            ORDER BY question_id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let entries = rows
            .iter()
            .map(map_entry_row)
            .collect::<Result<Vec<_>, _>>()?;

        let stats = sqlx::query(
            r"
            SELECT current_streak, best_streak, total_correct, total_incorrect
            FROM session_stats
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .as_ref()
        .map(map_stats_row)
        .transpose()?
        .unwrap_or_default();

        Ok(ProgressRecord::new(
            PerformanceLedger::from_entries(entries),
            stats,
        ))
    }

    async fn save(
        &self,
        ledger: &PerformanceLedger,
        stats: &SessionStats,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // The ledger is written as a whole snapshot so rows forgotten in
        // memory do not linger.
        sqlx::query("DELETE FROM question_performance")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for entry in ledger.iter() {
            sqlx::query(
                r"
                INSERT INTO question_performance (
                    question_id, correct_count, incorrect_count, last_seen
                )
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(id_to_i64(entry.question_id())?)
            .bind(i64::from(entry.correct_count()))
            .bind(i64::from(entry.incorrect_count()))
            .bind(entry.last_seen())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        sqlx::query(
            r"
            INSERT INTO session_stats (
                id, current_streak, best_streak, total_correct, total_incorrect
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                current_streak = excluded.current_streak,
                best_streak = excluded.best_streak,
                total_correct = excluded.total_correct,
                total_incorrect = excluded.total_incorrect
            ",
        )
        .bind(1_i64)
        .bind(i64::from(stats.current_streak()))
        .bind(i64::from(stats.best_streak()))
        .bind(i64::from(stats.total_correct()))
        .bind(i64::from(stats.total_incorrect()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        tracing::debug!(entries = ledger.len(), "progress saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        sqlx::query("DELETE FROM question_performance")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        sqlx::query("DELETE FROM session_stats")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
