use std::sync::Arc;

use quiz_core::selection::SelectionWeights;
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

/// Names accepted by [`SettingsService::set_field`], in display order.
pub const WEIGHT_FIELDS: [&str; 6] = [
    "unseen_weight",
    "base_weight",
    "gap_weight",
    "min_weight",
    "staleness_per_day",
    "max_staleness_days",
];

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted weights (or defaults if none were saved).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<SelectionWeights, SettingsServiceError> {
        let weights = self.repo.get_weights().await?;
        Ok(weights.unwrap_or_default())
    }

    /// Persist a complete weighting curve.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if persistence fails.
    pub async fn save(&self, weights: SelectionWeights) -> Result<SelectionWeights, SettingsServiceError> {
        self.repo.save_weights(&weights).await?;
        tracing::info!(?weights, "selection weights saved");
        Ok(weights)
    }

    /// Change one field of the saved curve, validate, and persist.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::UnknownField` for a name outside
    /// [`WEIGHT_FIELDS`], `InvalidValue` if `value` does not parse,
    /// `Weights` if the resulting curve is invalid, or `Storage` on failures.
    pub async fn set_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<SelectionWeights, SettingsServiceError> {
        let current = self.load().await?;
        let weights = with_field(&current, field, value)?;
        self.save(weights).await
    }

    /// Drop any saved curve in favour of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if persistence fails.
    pub async fn reset(&self) -> Result<SelectionWeights, SettingsServiceError> {
        self.save(SelectionWeights::default()).await
    }
}

fn with_field(
    current: &SelectionWeights,
    field: &str,
    value: &str,
) -> Result<SelectionWeights, SettingsServiceError> {
    let mut unseen = current.unseen_weight();
    let mut base = current.base_weight();
    let mut gap = current.gap_weight();
    let mut min = current.min_weight();
    let mut staleness = current.staleness_per_day();
    let mut max_days = current.max_staleness_days();

    match field {
        "unseen_weight" => unseen = parse_f64("unseen_weight", value)?,
        "base_weight" => base = parse_f64("base_weight", value)?,
        "gap_weight" => gap = parse_f64("gap_weight", value)?,
        "min_weight" => min = parse_f64("min_weight", value)?,
        "staleness_per_day" => staleness = parse_f64("staleness_per_day", value)?,
        "max_staleness_days" => {
            max_days = value
                .trim()
                .parse()
                .map_err(|_| SettingsServiceError::InvalidValue {
                    field: "max_staleness_days",
                    value: value.to_owned(),
                })?;
        }
        other => return Err(SettingsServiceError::UnknownField(other.to_owned())),
    }

    Ok(SelectionWeights::new(
        unseen, base, gap, min, staleness, max_days,
    )?)
}

fn parse_f64(field: &'static str, value: &str) -> Result<f64, SettingsServiceError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsServiceError::InvalidValue {
            field,
            value: value.to_owned(),
        })
}
