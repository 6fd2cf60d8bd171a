/// Streak and lifetime answer counters.
///
/// `best_streak` and the totals are lifetime values. `current_streak` is
/// logically per session but is checkpointed with everything else, so it keeps
/// counting across restarts until the next miss breaks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    current_streak: u32,
    best_streak: u32,
    total_correct: u32,
    total_incorrect: u32,
}

impl SessionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate counters from storage.
    ///
    /// A best streak lower than the current one is raised to match, so the
    /// high-water mark holds even for hand-edited rows.
    #[must_use]
    pub fn from_persisted(
        current_streak: u32,
        best_streak: u32,
        total_correct: u32,
        total_incorrect: u32,
    ) -> Self {
        Self {
            current_streak,
            best_streak: best_streak.max(current_streak),
            total_correct,
            total_incorrect,
        }
    }

    /// Apply one answer outcome.
    pub fn record_outcome(&mut self, was_correct: bool) {
        if was_correct {
            self.total_correct = self.total_correct.saturating_add(1);
            self.current_streak = self.current_streak.saturating_add(1);
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.total_incorrect = self.total_incorrect.saturating_add(1);
            self.current_streak = 0;
        }
    }

    /// Zero every counter, lifetime ones included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn total_incorrect(&self) -> u32 {
        self.total_incorrect
    }

    #[must_use]
    pub fn total_answered(&self) -> u32 {
        self.total_correct.saturating_add(self.total_incorrect)
    }
}
