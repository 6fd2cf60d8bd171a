//! Aggregate progress figures derived from the bank, ledger and stats.
//!
//! Everything here is a pure function of its inputs and costs one pass over
//! the bank, so callers recompute on demand instead of caching.

use crate::model::{DifficultyTier, PerformanceLedger, QuestionBank, SessionStats};

/// `round(100 * part / whole)`, or 0 when `whole` is 0.
#[must_use]
pub fn rounded_percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part);
    let whole = u64::from(whole);
    // Integer form of floor(x + 0.5) for non-negative x.
    let pct = (200 * part + whole) / (2 * whole);
    u32::try_from(pct).unwrap_or(u32::MAX)
}

fn count_tier(bank: &QuestionBank, ledger: &PerformanceLedger, tier: DifficultyTier) -> usize {
    bank.iter()
        .filter_map(|q| ledger.get(q.id()))
        .filter(|entry| entry.tier() == tier)
        .count()
}

/// Bank questions that have a ledger entry.
#[must_use]
pub fn studied_count(bank: &QuestionBank, ledger: &PerformanceLedger) -> usize {
    bank.iter().filter(|q| ledger.get(q.id()).is_some()).count()
}

/// Bank questions whose entry is easy-tier.
#[must_use]
pub fn mastered_count(bank: &QuestionBank, ledger: &PerformanceLedger) -> usize {
    count_tier(bank, ledger, DifficultyTier::Easy)
}

/// Bank questions whose entry is hard-tier. Zero disables the weak-spot drill.
#[must_use]
pub fn needs_practice_count(bank: &QuestionBank, ledger: &PerformanceLedger) -> usize {
    count_tier(bank, ledger, DifficultyTier::Hard)
}

/// Lifetime accuracy in whole percent, 0 before the first answer.
#[must_use]
pub fn accuracy(stats: &SessionStats) -> u32 {
    rounded_percent(stats.total_correct(), stats.total_answered())
}

/// Everything the dashboard shows, computed in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub bank_size: usize,
    pub studied: usize,
    pub mastered: usize,
    pub needs_practice: usize,
    pub accuracy: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn compute(bank: &QuestionBank, ledger: &PerformanceLedger, stats: &SessionStats) -> Self {
        Self {
            bank_size: bank.len(),
            studied: studied_count(bank, ledger),
            mastered: mastered_count(bank, ledger),
            needs_practice: needs_practice_count(bank, ledger),
            accuracy: accuracy(stats),
            current_streak: stats.current_streak(),
            best_streak: stats.best_streak(),
        }
    }

    /// Whether the weak-spot drill has anything to offer.
    #[must_use]
    pub fn weak_spot_available(&self) -> bool {
        self.needs_practice > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::model::question::tests::bank;
    use crate::time::fixed_now;

    fn answer(
        ledger: &mut PerformanceLedger,
        bank: &QuestionBank,
        stats: &mut SessionStats,
        id: u64,
        correct: bool,
    ) {
        ledger
            .record_answer(bank, QuestionId::new(id), correct, fixed_now())
            .unwrap();
        stats.record_outcome(correct);
    }

    #[test]
    fn empty_ledger_has_zero_everything() {
        let bank = bank(5);
        let ledger = PerformanceLedger::new();
        let snapshot = ProgressSnapshot::compute(&bank, &ledger, &SessionStats::new());

        assert_eq!(snapshot.bank_size, 5);
        assert_eq!(snapshot.studied, 0);
        assert_eq!(snapshot.mastered, 0);
        assert_eq!(snapshot.needs_practice, 0);
        assert_eq!(snapshot.accuracy, 0);
        assert!(!snapshot.weak_spot_available());
    }

    #[test]
    fn medium_entries_are_studied_but_in_neither_bucket() {
        let bank = bank(5);
        let mut ledger = PerformanceLedger::new();
        let mut stats = SessionStats::new();

        // q1: hard, q2: easy, q3: medium
        answer(&mut ledger, &bank, &mut stats, 1, false);
        answer(&mut ledger, &bank, &mut stats, 1, false);
        for _ in 0..3 {
            answer(&mut ledger, &bank, &mut stats, 2, true);
        }
        answer(&mut ledger, &bank, &mut stats, 3, true);
        answer(&mut ledger, &bank, &mut stats, 3, false);

        assert_eq!(studied_count(&bank, &ledger), 3);
        assert_eq!(mastered_count(&bank, &ledger), 1);
        assert_eq!(needs_practice_count(&bank, &ledger), 1);
        assert!(
            mastered_count(&bank, &ledger) + needs_practice_count(&bank, &ledger)
                <= studied_count(&bank, &ledger)
        );
        assert!(studied_count(&bank, &ledger) <= bank.len());
    }

    #[test]
    fn accuracy_rounds_to_nearest_percent() {
        assert_eq!(accuracy(&SessionStats::from_persisted(0, 0, 2, 1)), 67);
        assert_eq!(accuracy(&SessionStats::from_persisted(0, 0, 1, 2)), 33);
        assert_eq!(accuracy(&SessionStats::from_persisted(0, 0, 1, 1)), 50);
        assert_eq!(accuracy(&SessionStats::from_persisted(0, 0, 1, 7)), 13);
        assert_eq!(accuracy(&SessionStats::from_persisted(0, 0, 5, 0)), 100);
        assert_eq!(accuracy(&SessionStats::from_persisted(0, 0, 0, 5)), 0);
    }

    #[test]
    fn rounded_percent_rounds_half_up() {
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(1, 200), 1);
        assert_eq!(rounded_percent(0, 0), 0);
        assert_eq!(rounded_percent(u32::MAX, u32::MAX), 100);
    }

    #[test]
    fn reads_are_idempotent() {
        let bank = bank(4);
        let mut ledger = PerformanceLedger::new();
        let mut stats = SessionStats::new();
        answer(&mut ledger, &bank, &mut stats, 2, false);
        answer(&mut ledger, &bank, &mut stats, 4, true);

        let first = ProgressSnapshot::compute(&bank, &ledger, &stats);
        let second = ProgressSnapshot::compute(&bank, &ledger, &stats);
        assert_eq!(first, second);
    }

    #[test]
    fn entries_outside_the_bank_are_ignored() {
        let big = bank(6);
        let small = bank(3);
        let mut ledger = PerformanceLedger::new();
        let mut stats = SessionStats::new();
        answer(&mut ledger, &big, &mut stats, 5, false);
        answer(&mut ledger, &big, &mut stats, 5, false);

        assert_eq!(studied_count(&small, &ledger), 0);
        assert_eq!(needs_practice_count(&small, &ledger), 0);
    }
}
