use std::collections::HashSet;
use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuestionId, QuestionRecord, ShuffledOptions};
use quiz_core::selection::SelectionMode;

use super::timings::ModeTimings;
use crate::error::SessionError;
use crate::progress_service::ProgressService;

/// Result of one arcade answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ArcadeOutcome {
    /// Correct: the run goes on, a little faster.
    Continue { score: u32, speed: f64 },
    /// Wrong: the run is over.
    GameOver { score: u32, correct_answer: String },
}

/// Endless question feed behind the arcade games.
///
/// Cycles through a weighted selection of the whole bank and reselects once
/// the selection is used up, so the feed reflects the latest ledger. One
/// wrong answer ends the run.
pub struct ArcadeRun {
    bank: Arc<QuestionBank>,
    feed: Vec<QuestionId>,
    cursor: usize,
    options: Option<ShuffledOptions>,
    score: u32,
    speed: f64,
    timings: ModeTimings,
    over: bool,
}

impl ArcadeRun {
    /// # Errors
    ///
    /// Returns `SessionError::NoMaterial` for an empty bank.
    pub fn start(progress: &ProgressService, timings: ModeTimings) -> Result<Self, SessionError> {
        let mut run = Self {
            bank: Arc::clone(progress.bank()),
            feed: Vec::new(),
            cursor: 0,
            options: None,
            score: 0,
            speed: 1.0,
            timings,
            over: false,
        };
        run.refill(progress);
        if run.feed.is_empty() {
            return Err(SessionError::NoMaterial);
        }
        run.present();
        Ok(run)
    }

    /// Begin a new run at score zero and base speed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoMaterial` for an empty bank.
    pub fn restart(&mut self, progress: &ProgressService) -> Result<(), SessionError> {
        *self = Self::start(progress, self.timings)?;
        Ok(())
    }

    fn refill(&mut self, progress: &ProgressService) {
        let feed = progress.select(&HashSet::new(), self.bank.len(), SelectionMode::All);
        if !feed.is_empty() {
            self.feed = feed;
            self.cursor = 0;
        }
    }

    fn current_id(&self) -> Option<QuestionId> {
        if self.over || self.feed.is_empty() {
            return None;
        }
        self.feed.get(self.cursor % self.feed.len()).copied()
    }

    fn present(&mut self) {
        self.options = self
            .current_id()
            .and_then(|id| self.bank.get(id))
            .map(|question| ShuffledOptions::new(question, &mut rand::rng()));
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuestionRecord> {
        self.current_id().and_then(|id| self.bank.get(id))
    }

    #[must_use]
    pub fn options(&self) -> Option<&ShuffledOptions> {
        self.options.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Speed multiplier, starting at 1.0.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Answer the current question with an option index.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after game over,
    /// `SessionError::InvalidOption` for an out-of-range index, and
    /// `SessionError::Progress` if the answer cannot be recorded.
    pub async fn answer(
        &mut self,
        progress: &mut ProgressService,
        index: usize,
    ) -> Result<ArcadeOutcome, SessionError> {
        let question_id = self.current_id().ok_or(SessionError::Completed)?;
        let options = self.options.as_ref().ok_or(SessionError::Completed)?;
        if index >= options.len() {
            return Err(SessionError::InvalidOption {
                index,
                len: options.len(),
            });
        }
        let was_correct = index == options.correct_index();

        progress.record_answer(question_id, was_correct).await?;

        if !was_correct {
            self.over = true;
            self.options = None;
            let correct_answer = self
                .bank
                .get(question_id)
                .map(|q| q.correct_answer().to_owned())
                .unwrap_or_default();
            tracing::info!(score = self.score, "arcade run over");
            return Ok(ArcadeOutcome::GameOver {
                score: self.score,
                correct_answer,
            });
        }

        self.score = self.score.saturating_add(1);
        self.speed = (self.speed + self.timings.arcade_speed_step).min(self.timings.arcade_max_speed);
        self.cursor += 1;
        if self.cursor >= self.feed.len() {
            self.refill(progress);
        }
        self.present();

        Ok(ArcadeOutcome::Continue {
            score: self.score,
            speed: self.speed,
        })
    }
}
