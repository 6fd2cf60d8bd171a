use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use quiz_core::metrics::ProgressSnapshot;
use quiz_core::model::{
    PerformanceEntry, PerformanceLedger, QuestionBank, QuestionId, SessionStats,
};
use quiz_core::selection::{SelectionMode, SelectionWeights, Selector};
use storage::repository::ProgressStore;

use crate::Clock;
use crate::error::ProgressError;

//
// ─── PROGRESS SERVICE ──────────────────────────────────────────────────────────
//

/// The single owner of learner progress.
///
/// Holds the ledger and the session stats in memory, applies every answer to
/// both in order, and checkpoints them to the store after each mutation.
/// The in-memory values are authoritative: a failed checkpoint is logged and
/// counted, never rolled back.
pub struct ProgressService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    store: Arc<dyn ProgressStore>,
    selector: Selector,
    ledger: PerformanceLedger,
    stats: SessionStats,
    save_failures: u32,
}

impl ProgressService {
    /// Load saved progress for `bank` from `store`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the store cannot be read.
    pub async fn load(
        store: Arc<dyn ProgressStore>,
        bank: Arc<QuestionBank>,
        weights: SelectionWeights,
        clock: Clock,
    ) -> Result<Self, ProgressError> {
        let record = store.load().await?;
        let foreign = record
            .ledger
            .iter()
            .filter(|entry| !bank.contains(entry.question_id()))
            .count();
        if foreign > 0 {
            tracing::warn!(
                entries = foreign,
                "stored progress mentions questions missing from the bank"
            );
        }
        tracing::info!(
            questions = bank.len(),
            studied = record.ledger.len(),
            answered = record.stats.total_answered(),
            "progress loaded"
        );

        Ok(Self {
            clock,
            bank,
            store,
            selector: Selector::new(weights),
            ledger: record.ledger,
            stats: record.stats,
            save_failures: 0,
        })
    }

    /// Start with empty progress, ignoring whatever the store holds.
    ///
    /// The next checkpoint overwrites the stored progress.
    #[must_use]
    pub fn fresh(
        store: Arc<dyn ProgressStore>,
        bank: Arc<QuestionBank>,
        weights: SelectionWeights,
        clock: Clock,
    ) -> Self {
        tracing::info!(questions = bank.len(), "starting with fresh progress");
        Self {
            clock,
            bank,
            store,
            selector: Selector::new(weights),
            ledger: PerformanceLedger::new(),
            stats: SessionStats::new(),
            save_failures: 0,
        }
    }

    #[must_use]
    pub fn bank(&self) -> &Arc<QuestionBank> {
        &self.bank
    }

    #[must_use]
    pub fn ledger(&self) -> &PerformanceLedger {
        &self.ledger
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }

    #[must_use]
    pub fn weights(&self) -> &SelectionWeights {
        self.selector.weights()
    }

    /// Swap the weighting curve used by later selections.
    pub fn set_weights(&mut self, weights: SelectionWeights) {
        self.selector = Selector::new(weights);
    }

    /// Number of checkpoints that failed since this handle was created.
    #[must_use]
    pub fn save_failures(&self) -> u32 {
        self.save_failures
    }

    /// Ledger entry for `question_id`, or the unseen sentinel.
    #[must_use]
    pub fn entry(&self, question_id: QuestionId) -> PerformanceEntry {
        self.ledger.entry(question_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::compute(&self.bank, &self.ledger, &self.stats)
    }

    /// Pick up to `count` question ids from the bank minus `exclude`.
    #[must_use]
    pub fn select(
        &self,
        exclude: &HashSet<QuestionId>,
        count: usize,
        mode: SelectionMode,
    ) -> Vec<QuestionId> {
        self.select_with_rng(exclude, count, mode, &mut rand::rng())
    }

    /// [`ProgressService::select`] with a caller-supplied random source.
    pub fn select_with_rng<R: Rng + ?Sized>(
        &self,
        exclude: &HashSet<QuestionId>,
        count: usize,
        mode: SelectionMode,
        rng: &mut R,
    ) -> Vec<QuestionId> {
        let pool = self.bank.excluding(exclude);
        let picked: Vec<QuestionId> = self
            .selector
            .select(pool, &self.ledger, count, mode, self.clock.now(), rng)
            .into_iter()
            .map(|question| question.id())
            .collect();
        tracing::debug!(
            ?mode,
            requested = count,
            excluded = exclude.len(),
            selected = picked.len(),
            "questions selected"
        );
        picked
    }

    /// Record one answer: ledger first, then stats, then a checkpoint.
    ///
    /// A failed checkpoint does not fail the answer.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownQuestion` if `question_id` is not in the
    /// bank. Neither the ledger nor the stats change in that case.
    pub async fn record_answer(
        &mut self,
        question_id: QuestionId,
        was_correct: bool,
    ) -> Result<PerformanceEntry, ProgressError> {
        let entry = self
            .ledger
            .record_answer(&self.bank, question_id, was_correct, self.clock.now())
            .map_err(|err| {
                tracing::error!(%question_id, error = %err, "answer rejected");
                ProgressError::UnknownQuestion(question_id)
            })?;
        self.stats.record_outcome(was_correct);
        tracing::debug!(
            %question_id,
            was_correct,
            tier = %entry.tier(),
            streak = self.stats.current_streak(),
            "answer recorded"
        );

        self.checkpoint().await;
        Ok(entry)
    }

    /// Forget all progress, in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the store cannot be cleared. The
    /// in-memory progress is already cleared at that point.
    pub async fn reset(&mut self) -> Result<(), ProgressError> {
        self.ledger.reset();
        self.stats.reset();
        self.store.clear().await?;
        tracing::info!("progress reset");
        Ok(())
    }

    /// Final checkpoint. Unlike the per-answer saves, its failure is returned.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the save fails.
    pub async fn shutdown(self) -> Result<(), ProgressError> {
        self.store.save(&self.ledger, &self.stats).await?;
        tracing::info!(
            studied = self.ledger.len(),
            failed_saves = self.save_failures,
            "progress saved on shutdown"
        );
        Ok(())
    }

    async fn checkpoint(&mut self) {
        if let Err(err) = self.store.save(&self.ledger, &self.stats).await {
            self.save_failures = self.save_failures.saturating_add(1);
            tracing::warn!(
                error = %err,
                failures = self.save_failures,
                "progress checkpoint failed; keeping in-memory state"
            );
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
