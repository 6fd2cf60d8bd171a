use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::performance::PerformanceEntry;
use crate::model::question::QuestionBank;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("answer recorded for question {0}, which is not in the bank")]
    UnknownQuestion(QuestionId),
}

/// Per-question answer history, keyed by question id.
///
/// An entry exists exactly for the questions that have been answered at least
/// once. Entries are only created or changed by [`PerformanceLedger::record_answer`]
/// and only removed by [`PerformanceLedger::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceLedger {
    entries: HashMap<QuestionId, PerformanceEntry>,
}

impl PerformanceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted entries. Later duplicates win.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = PerformanceEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.question_id(), entry))
                .collect(),
        }
    }

    /// Record one answer for a bank question.
    ///
    /// Creates the entry on first encounter, otherwise bumps the matching
    /// counter, stamps `last_seen` with `at` and recomputes the tier.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownQuestion` when `question_id` is not in
    /// `bank`. The ledger is left untouched in that case.
    pub fn record_answer(
        &mut self,
        bank: &QuestionBank,
        question_id: QuestionId,
        was_correct: bool,
        at: DateTime<Utc>,
    ) -> Result<PerformanceEntry, LedgerError> {
        if !bank.contains(question_id) {
            return Err(LedgerError::UnknownQuestion(question_id));
        }

        let entry = self
            .entries
            .entry(question_id)
            .and_modify(|entry| entry.record(was_correct, at))
            .or_insert_with(|| PerformanceEntry::first_answer(question_id, was_correct, at));
        Ok(*entry)
    }

    /// The stored entry, or the "unseen" sentinel when there is none.
    #[must_use]
    pub fn entry(&self, question_id: QuestionId) -> PerformanceEntry {
        self.entries
            .get(&question_id)
            .copied()
            .unwrap_or_else(|| PerformanceEntry::unseen(question_id))
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&PerformanceEntry> {
        self.entries.get(&question_id)
    }

    /// Forget every entry. Only used by explicit "start over" actions.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &PerformanceEntry> {
        self.entries.values()
    }
}
