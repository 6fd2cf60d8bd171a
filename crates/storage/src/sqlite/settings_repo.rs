use async_trait::async_trait;
use quiz_core::selection::SelectionWeights;

use crate::repository::{SettingsRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{conn, map_weights_row};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_weights(&self) -> Result<Option<SelectionWeights>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                unseen_weight,
                base_weight,
                gap_weight,
                min_weight,
                staleness_per_day,
                max_staleness_days
            FROM app_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_weights_row).transpose()
    }

    async fn save_weights(&self, weights: &SelectionWeights) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO app_settings (
                id,
                unseen_weight,
                base_weight,
                gap_weight,
                min_weight,
                staleness_per_day,
                max_staleness_days
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                unseen_weight = excluded.unseen_weight,
                base_weight = excluded.base_weight,
                gap_weight = excluded.gap_weight,
                min_weight = excluded.min_weight,
                staleness_per_day = excluded.staleness_per_day,
                max_staleness_days = excluded.max_staleness_days
            ",
        )
        .bind(1_i64)
        .bind(weights.unseen_weight())
        .bind(weights.base_weight())
        .bind(weights.gap_weight())
        .bind(weights.min_weight())
        .bind(weights.staleness_per_day())
        .bind(i64::from(weights.max_staleness_days()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
