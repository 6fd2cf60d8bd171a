use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies each schema version that is not yet recorded in `schema_migrations`.
///
/// Version 1 creates the per-question ledger, the single-row stats table and
/// the single-row settings table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS question_performance (
                    question_id INTEGER PRIMARY KEY,
                    correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
                    incorrect_count INTEGER NOT NULL CHECK (incorrect_count >= 0),
                    last_seen TEXT NOT NULL,
                    CHECK (correct_count + incorrect_count >= 1)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_stats (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    current_streak INTEGER NOT NULL CHECK (current_streak >= 0),
                    best_streak INTEGER NOT NULL CHECK (best_streak >= 0),
                    total_correct INTEGER NOT NULL CHECK (total_correct >= 0),
                    total_incorrect INTEGER NOT NULL CHECK (total_incorrect >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS app_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    unseen_weight REAL NOT NULL,
                    base_weight REAL NOT NULL,
                    gap_weight REAL NOT NULL,
                    min_weight REAL NOT NULL,
                    staleness_per_day REAL NOT NULL,
                    max_staleness_days INTEGER NOT NULL CHECK (max_staleness_days >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
