//! Adaptive question selection.
//!
//! Every eligible question gets a weight from its ledger entry, then the pool
//! is put through a weighted random shuffle (Efraimidis–Spirakis: each item
//! draws `u` uniformly from `(0, 1]` and items are ordered by `ln(u) / w`,
//! largest first). Heavier questions tend to come first, but any question can
//! land in any position, so repeated calls on the same ledger still vary.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::model::{DifficultyTier, PerformanceEntry, PerformanceLedger, QuestionRecord};
use crate::time::days_between;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SelectionWeightsError {
    #[error("{field} must be finite and > 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite and >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("unseen_weight ({unseen}) must be at least base_weight ({base})")]
    UnseenBelowBase { unseen: f64, base: f64 },
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// Which part of the pool is eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    /// Everything the caller passed in.
    All,
    /// Only questions whose entry is hard-tier.
    WeakSpot,
}

impl SelectionMode {
    fn admits(self, entry: Option<&PerformanceEntry>) -> bool {
        match self {
            SelectionMode::All => true,
            SelectionMode::WeakSpot => {
                entry.is_some_and(|entry| entry.tier() == DifficultyTier::Hard)
            }
        }
    }
}

//
// ─── WEIGHTS ───────────────────────────────────────────────────────────────────
//

/// Tunable weighting curve.
///
/// For a question that has been answered:
///
/// ```text
/// gap       = incorrect_count - correct_count
/// days      = min(days since last_seen, max_staleness_days)
/// raw       = max(base_weight + gap_weight * gap, min_weight)
/// weight    = min(raw * (1 + staleness_per_day * days), unseen_weight)
/// ```
///
/// Never-answered questions always get `unseen_weight`, the top of the range,
/// so fresh material tends to be covered before old material repeats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionWeights {
    unseen_weight: f64,
    base_weight: f64,
    gap_weight: f64,
    min_weight: f64,
    staleness_per_day: f64,
    max_staleness_days: u32,
}

impl SelectionWeights {
    pub const DEFAULT_UNSEEN_WEIGHT: f64 = 8.0;
    pub const DEFAULT_BASE_WEIGHT: f64 = 2.0;
    pub const DEFAULT_GAP_WEIGHT: f64 = 1.5;
    pub const DEFAULT_MIN_WEIGHT: f64 = 0.25;
    pub const DEFAULT_STALENESS_PER_DAY: f64 = 0.1;
    pub const DEFAULT_MAX_STALENESS_DAYS: u32 = 30;

    /// Build a validated weighting curve.
    ///
    /// # Errors
    ///
    /// Returns `SelectionWeightsError` if a weight is not finite, `unseen_weight`,
    /// `base_weight` or `min_weight` is not positive, `gap_weight` or
    /// `staleness_per_day` is negative, or `unseen_weight < base_weight`.
    pub fn new(
        unseen_weight: f64,
        base_weight: f64,
        gap_weight: f64,
        min_weight: f64,
        staleness_per_day: f64,
        max_staleness_days: u32,
    ) -> Result<Self, SelectionWeightsError> {
        for (field, value) in [
            ("unseen_weight", unseen_weight),
            ("base_weight", base_weight),
            ("min_weight", min_weight),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SelectionWeightsError::NotPositive { field, value });
            }
        }
        for (field, value) in [
            ("gap_weight", gap_weight),
            ("staleness_per_day", staleness_per_day),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SelectionWeightsError::Negative { field, value });
            }
        }
        if unseen_weight < base_weight {
            return Err(SelectionWeightsError::UnseenBelowBase {
                unseen: unseen_weight,
                base: base_weight,
            });
        }

        Ok(Self {
            unseen_weight,
            base_weight,
            gap_weight,
            min_weight,
            staleness_per_day,
            max_staleness_days,
        })
    }

    #[must_use]
    pub fn unseen_weight(&self) -> f64 {
        self.unseen_weight
    }

    #[must_use]
    pub fn base_weight(&self) -> f64 {
        self.base_weight
    }

    #[must_use]
    pub fn gap_weight(&self) -> f64 {
        self.gap_weight
    }

    #[must_use]
    pub fn min_weight(&self) -> f64 {
        self.min_weight
    }

    #[must_use]
    pub fn staleness_per_day(&self) -> f64 {
        self.staleness_per_day
    }

    #[must_use]
    pub fn max_staleness_days(&self) -> u32 {
        self.max_staleness_days
    }

    /// Selection weight of a question given its entry (`None` = never answered).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn weight(&self, entry: Option<&PerformanceEntry>, now: DateTime<Utc>) -> f64 {
        let Some(entry) = entry.filter(|entry| entry.is_seen()) else {
            return self.unseen_weight;
        };

        let raw = (self.base_weight + self.gap_weight * entry.miss_gap() as f64)
            .max(self.min_weight);
        let days = days_between(entry.last_seen(), now).min(i64::from(self.max_staleness_days));
        let staleness = 1.0 + self.staleness_per_day * days as f64;

        (raw * staleness).min(self.unseen_weight)
    }
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            unseen_weight: Self::DEFAULT_UNSEEN_WEIGHT,
            base_weight: Self::DEFAULT_BASE_WEIGHT,
            gap_weight: Self::DEFAULT_GAP_WEIGHT,
            min_weight: Self::DEFAULT_MIN_WEIGHT,
            staleness_per_day: Self::DEFAULT_STALENESS_PER_DAY,
            max_staleness_days: Self::DEFAULT_MAX_STALENESS_DAYS,
        }
    }
}

//
// ─── SELECTOR ──────────────────────────────────────────────────────────────────
//

/// Turns a pool, the ledger, a count and a mode into an ordered question list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selector {
    weights: SelectionWeights,
}

impl Selector {
    #[must_use]
    pub fn new(weights: SelectionWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &SelectionWeights {
        &self.weights
    }

    /// Select up to `count` questions from `pool`.
    ///
    /// - The result has `min(count, eligible)` items and no repeated ids
    ///   (a repeated id in `pool` is only considered once).
    /// - `SelectionMode::WeakSpot` keeps only hard-tier questions; with none
    ///   eligible the result is empty rather than padded with other material.
    pub fn select<'a, R: Rng + ?Sized>(
        &self,
        pool: impl IntoIterator<Item = &'a QuestionRecord>,
        ledger: &PerformanceLedger,
        count: usize,
        mode: SelectionMode,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<&'a QuestionRecord> {
        if count == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut keyed: Vec<(f64, &'a QuestionRecord)> = pool
            .into_iter()
            .filter(|question| seen.insert(question.id()))
            .filter_map(|question| {
                let entry = ledger.get(question.id());
                mode.admits(entry)
                    .then(|| (self.weights.weight(entry, now), question))
            })
            .map(|(weight, question)| (sort_key(weight, rng), question))
            .collect();

        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        keyed.truncate(count);
        keyed.into_iter().map(|(_, question)| question).collect()
    }
}

fn sort_key<R: Rng + ?Sized>(weight: f64, rng: &mut R) -> f64 {
    // `random` is in [0, 1); flip it to (0, 1] so `ln` stays finite.
    let u: f64 = 1.0 - rng.random::<f64>();
    u.ln() / weight
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
