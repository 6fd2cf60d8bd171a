use crate::metrics::rounded_percent;

/// Running score for one mode session.
///
/// Unlike [`SessionStats`](crate::model::SessionStats) this is never
/// persisted; a restart starts from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionScore {
    answered: u32,
    correct: u32,
    improved: u32,
}

impl SessionScore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one answer. `was_weak_spot` marks a question that was hard-tier
    /// before this answer, so a correct answer on it counts as an improvement.
    pub fn record(&mut self, was_correct: bool, was_weak_spot: bool) {
        self.answered = self.answered.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
            if was_weak_spot {
                self.improved = self.improved.saturating_add(1);
            }
        }
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn improved(&self) -> u32 {
        self.improved
    }

    /// Share of this session's answers that were correct, 0 when none.
    #[must_use]
    pub fn accuracy(&self) -> u32 {
        rounded_percent(self.correct, self.answered)
    }

    /// Improved weak spots as a share of `drilled` questions.
    #[must_use]
    pub fn improvement_rate(&self, drilled: u32) -> u32 {
        rounded_percent(self.improved, drilled)
    }
}
