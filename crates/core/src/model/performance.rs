use chrono::{DateTime, Utc};
use std::fmt;

use crate::model::ids::QuestionId;
use crate::time::never_seen;

/// Answers needed, with no misses, before a question counts as mastered.
pub const MASTERY_THRESHOLD: u32 = 3;

//
// ─── DIFFICULTY TIER ───────────────────────────────────────────────────────────
//

/// Coarse classification derived from a question's correctness counts.
///
/// - `Hard`: more misses than correct answers (a weak spot)
/// - `Easy`: at least [`MASTERY_THRESHOLD`] correct answers and no misses
/// - `Medium`: everything else, including never-answered questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    #[must_use]
    pub fn classify(correct_count: u32, incorrect_count: u32) -> Self {
        if incorrect_count > correct_count {
            Self::Hard
        } else if correct_count >= MASTERY_THRESHOLD && incorrect_count == 0 {
            Self::Easy
        } else {
            Self::Medium
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── PERFORMANCE ENTRY ─────────────────────────────────────────────────────────
//

/// Answer history for one question.
///
/// The tier is always recomputed from the counts; there is no setter for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceEntry {
    question_id: QuestionId,
    correct_count: u32,
    incorrect_count: u32,
    last_seen: DateTime<Utc>,
    tier: DifficultyTier,
}

impl PerformanceEntry {
    /// The value handed out for questions that have never been answered:
    /// zero counts, medium tier, `last_seen` at the Unix epoch.
    #[must_use]
    pub fn unseen(question_id: QuestionId) -> Self {
        Self {
            question_id,
            correct_count: 0,
            incorrect_count: 0,
            last_seen: never_seen(),
            tier: DifficultyTier::Medium,
        }
    }

    /// First answer for a question.
    #[must_use]
    pub fn first_answer(question_id: QuestionId, was_correct: bool, at: DateTime<Utc>) -> Self {
        let mut entry = Self::unseen(question_id);
        entry.record(was_correct, at);
        entry
    }

    /// Rehydrate an entry from storage. The tier is derived, not read.
    #[must_use]
    pub fn from_persisted(
        question_id: QuestionId,
        correct_count: u32,
        incorrect_count: u32,
        last_seen: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            correct_count,
            incorrect_count,
            last_seen,
            tier: DifficultyTier::classify(correct_count, incorrect_count),
        }
    }

    pub(crate) fn record(&mut self, was_correct: bool, at: DateTime<Utc>) {
        if was_correct {
            self.correct_count = self.correct_count.saturating_add(1);
        } else {
            self.incorrect_count = self.incorrect_count.saturating_add(1);
        }
        self.last_seen = at;
        self.tier = DifficultyTier::classify(self.correct_count, self.incorrect_count);
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    #[must_use]
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    #[must_use]
    pub fn tier(&self) -> DifficultyTier {
        self.tier
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.correct_count.saturating_add(self.incorrect_count)
    }

    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.attempts() > 0
    }

    /// `incorrect_count - correct_count`; negative once a question is mostly right.
    #[must_use]
    pub fn miss_gap(&self) -> i64 {
        i64::from(self.incorrect_count) - i64::from(self.correct_count)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
