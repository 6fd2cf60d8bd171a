use quiz_core::metrics::rounded_percent;

/// Where a mode session stands, for "3 / 10" counters and progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Answered share of the session in whole percent.
    #[must_use]
    pub fn percent_done(&self) -> u32 {
        let clamp = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        rounded_percent(clamp(self.answered), clamp(self.total))
    }
}
