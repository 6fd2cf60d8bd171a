use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    DifficultyTier, PerformanceEntry, QuestionBank, QuestionId, QuestionRecord, SessionScore,
    ShuffledOptions,
};
use quiz_core::selection::SelectionMode;

use super::progress::SessionProgress;
use crate::error::SessionError;
use crate::progress_service::ProgressService;

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// The question-at-a-time study modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizKind {
    /// Pick one of the shuffled options.
    MultipleChoice,
    /// Flip the card, then self-grade.
    Flashcards,
    /// Type the answer; matching is lenient.
    TypedAnswer,
    /// Multiple choice over hard-tier questions only.
    WeakSpot,
}

impl QuizKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizKind::MultipleChoice => "quiz",
            QuizKind::Flashcards => "flashcards",
            QuizKind::TypedAnswer => "typed answer",
            QuizKind::WeakSpot => "weak spot",
        }
    }

    #[must_use]
    pub fn selection_mode(self) -> SelectionMode {
        match self {
            QuizKind::WeakSpot => SelectionMode::WeakSpot,
            _ => SelectionMode::All,
        }
    }

    fn uses_options(self) -> bool {
        matches!(self, QuizKind::MultipleChoice | QuizKind::WeakSpot)
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// What the learner sees right after answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub was_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    /// Ledger entry after this answer was recorded.
    pub entry: PerformanceEntry,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through a selected list of questions in a single mode.
///
/// Questions answered during this session are kept out of the next
/// selection made by [`QuizSession::restart`]; once the whole bank has been
/// answered the exclusion set starts over.
pub struct QuizSession {
    kind: QuizKind,
    bank: Arc<QuestionBank>,
    size: Option<usize>,
    queue: Vec<QuestionId>,
    position: usize,
    answered_ids: HashSet<QuestionId>,
    options: Option<ShuffledOptions>,
    hint_revealed: bool,
    flipped: bool,
    feedback: Option<AnswerFeedback>,
    score: SessionScore,
}

impl QuizSession {
    /// Select questions and present the first one.
    ///
    /// `size` caps the number of questions; `None` takes the whole eligible pool.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoMaterial` when selection yields nothing, e.g. a
    /// weak-spot drill with no hard-tier questions.
    pub fn start(
        progress: &ProgressService,
        kind: QuizKind,
        size: Option<usize>,
    ) -> Result<Self, SessionError> {
        let mut session = Self {
            kind,
            bank: Arc::clone(progress.bank()),
            size,
            queue: Vec::new(),
            position: 0,
            answered_ids: HashSet::new(),
            options: None,
            hint_revealed: false,
            flipped: false,
            feedback: None,
            score: SessionScore::new(),
        };
        session.fill_queue(progress)?;
        Ok(session)
    }

    /// Start over with a fresh selection and a zero score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoMaterial` when selection yields nothing. The
    /// session is left unchanged in that case.
    pub fn restart(&mut self, progress: &ProgressService) -> Result<(), SessionError> {
        self.fill_queue(progress)
    }

    fn fill_queue(&mut self, progress: &ProgressService) -> Result<(), SessionError> {
        let count = self.size.unwrap_or_else(|| self.bank.len());
        let mode = self.kind.selection_mode();

        let mut queue = progress.select(&self.answered_ids, count, mode);
        let mut cleared_exclusions = false;
        if queue.is_empty() && !self.answered_ids.is_empty() {
            tracing::debug!(kind = %self.kind, "session pool exhausted; starting over");
            queue = progress.select(&HashSet::new(), count, mode);
            cleared_exclusions = true;
        }
        if queue.is_empty() {
            return Err(SessionError::NoMaterial);
        }
        if cleared_exclusions {
            self.answered_ids.clear();
        }

        tracing::info!(kind = %self.kind, questions = queue.len(), "session started");
        self.queue = queue;
        self.position = 0;
        self.score = SessionScore::new();
        self.present();
        Ok(())
    }

    fn present(&mut self) {
        self.hint_revealed = false;
        self.flipped = false;
        self.feedback = None;
        self.options = if self.kind.uses_options() {
            self.queue
                .get(self.position)
                .and_then(|id| self.bank.get(*id))
                .map(|question| ShuffledOptions::new(question, &mut rand::rng()))
        } else {
            None
        };
    }

    #[must_use]
    pub fn kind(&self) -> QuizKind {
        self.kind
    }

    /// The question on screen, `None` once the session is complete.
    #[must_use]
    pub fn current(&self) -> Option<&QuestionRecord> {
        self.queue
            .get(self.position)
            .and_then(|id| self.bank.get(*id))
    }

    /// Option order for the current question (option-based modes only).
    #[must_use]
    pub fn options(&self) -> Option<&ShuffledOptions> {
        self.options.as_ref()
    }

    /// The hint, once revealed.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        if self.hint_revealed {
            self.current().map(QuestionRecord::hint)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.position >= self.queue.len()
    }

    #[must_use]
    pub fn score(&self) -> SessionScore {
        self.score
    }

    /// Questions selected for this run.
    #[must_use]
    pub fn drilled(&self) -> usize {
        self.queue.len()
    }

    /// Improved weak spots as a share of the drilled questions.
    #[must_use]
    pub fn improvement_rate(&self) -> u32 {
        self.score
            .improvement_rate(u32::try_from(self.queue.len()).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.queue.len();
        let answered = usize::try_from(self.score.answered()).unwrap_or(usize::MAX);
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// Reveal the current question's hint.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if there is no current question.
    pub fn reveal_hint(&mut self) -> Result<&str, SessionError> {
        if self.current().is_none() {
            return Err(SessionError::Completed);
        }
        self.hint_revealed = true;
        self.hint().ok_or(SessionError::Completed)
    }

    /// Turn the flashcard over to show the answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` outside flashcards,
    /// `SessionError::Completed` past the last card, and
    /// `SessionError::AlreadyAnswered` once the card was graded.
    pub fn flip(&mut self) -> Result<(), SessionError> {
        self.ensure_answerable(QuizKind::Flashcards)?;
        self.flipped = true;
        Ok(())
    }

    /// Answer with the option at `index` of [`QuizSession::options`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` outside option-based modes,
    /// `SessionError::Completed` past the last question,
    /// `SessionError::AlreadyAnswered` during feedback,
    /// `SessionError::InvalidOption` for an out-of-range index, and
    /// `SessionError::Progress` if the answer cannot be recorded.
    pub async fn answer_option(
        &mut self,
        progress: &mut ProgressService,
        index: usize,
    ) -> Result<AnswerFeedback, SessionError> {
        if !self.kind.uses_options() {
            return Err(SessionError::WrongMode(self.kind.as_str()));
        }
        self.ensure_answerable(self.kind)?;
        let options = self.options.as_ref().ok_or(SessionError::Completed)?;
        let picked = options.get(index).ok_or(SessionError::InvalidOption {
            index,
            len: options.len(),
        })?;
        let was_correct = self
            .current()
            .is_some_and(|question| question.is_correct_option(picked));
        self.submit(progress, was_correct).await
    }

    /// Answer by typing. Case, spacing and trailing punctuation are forgiven.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSession::answer_option`], minus the option range check.
    pub async fn answer_text(
        &mut self,
        progress: &mut ProgressService,
        text: &str,
    ) -> Result<AnswerFeedback, SessionError> {
        self.ensure_answerable(QuizKind::TypedAnswer)?;
        let was_correct = self
            .current()
            .is_some_and(|question| question.matches_typed_answer(text));
        self.submit(progress, was_correct).await
    }

    /// Grade a flipped flashcard as known or not.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFlipped` before [`QuizSession::flip`], plus
    /// the errors of [`QuizSession::flip`].
    pub async fn self_grade(
        &mut self,
        progress: &mut ProgressService,
        knew: bool,
    ) -> Result<AnswerFeedback, SessionError> {
        self.ensure_answerable(QuizKind::Flashcards)?;
        if !self.flipped {
            return Err(SessionError::NotFlipped);
        }
        self.submit(progress, knew).await
    }

    /// Move past the feedback to the next question.
    ///
    /// Returns whether there is another question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` past the last question and
    /// `SessionError::NotAnswered` if the current one has no answer yet.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.feedback.is_none() {
            return Err(SessionError::NotAnswered);
        }
        self.position += 1;
        self.present();
        Ok(!self.is_complete())
    }

    fn ensure_answerable(&self, expected: QuizKind) -> Result<(), SessionError> {
        if self.kind != expected {
            return Err(SessionError::WrongMode(self.kind.as_str()));
        }
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.feedback.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        Ok(())
    }

    async fn submit(
        &mut self,
        progress: &mut ProgressService,
        was_correct: bool,
    ) -> Result<AnswerFeedback, SessionError> {
        let question_id = *self
            .queue
            .get(self.position)
            .ok_or(SessionError::Completed)?;
        let was_weak_spot = progress.entry(question_id).tier() == DifficultyTier::Hard;

        let entry = progress.record_answer(question_id, was_correct).await?;
        self.score.record(was_correct, was_weak_spot);
        self.answered_ids.insert(question_id);

        let (correct_answer, explanation) = self
            .bank
            .get(question_id)
            .map(|q| (q.correct_answer().to_owned(), q.explanation().to_owned()))
            .unwrap_or_default();
        let feedback = AnswerFeedback {
            question_id,
            was_correct,
            correct_answer,
            explanation,
            entry,
        };
        self.feedback = Some(feedback.clone());
        Ok(feedback)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress_service::tests::service;
    use storage::repository::InMemoryRepository;

    async fn answer_correctly(session: &mut QuizSession, progress: &mut ProgressService) {
        let index = session.options().unwrap().correct_index();
        let feedback = session.answer_option(progress, index).await.unwrap();
        assert!(feedback.was_correct);
    }

    async fn answer_wrongly(session: &mut QuizSession, progress: &mut ProgressService) {
        let index = (session.options().unwrap().correct_index() + 1) % 3;
        let feedback = session.answer_option(progress, index).await.unwrap();
        assert!(!feedback.was_correct);
    }

    #[tokio::test]
    async fn default_size_covers_the_whole_bank_once() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 5).await;
        let mut session = QuizSession::start(&progress, QuizKind::MultipleChoice, None).unwrap();

        let mut seen = HashSet::new();
        while let Some(question) = session.current() {
            assert!(seen.insert(question.id()));
            answer_correctly(&mut session, &mut progress).await;
            session.advance().unwrap();
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(session.score().accuracy(), 100);
        assert_eq!(progress.stats().current_streak(), 5);
        assert!(session.progress().is_complete);
    }

    #[tokio::test]
    async fn explicit_size_caps_the_run() {
        let repo = InMemoryRepository::new();
        let progress = service(&repo, 6).await;
        let session = QuizSession::start(&progress, QuizKind::MultipleChoice, Some(2)).unwrap();
        assert_eq!(session.progress().total, 2);
        assert_eq!(session.progress().remaining, 2);
    }

    #[tokio::test]
    async fn second_answer_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        let mut session = QuizSession::start(&progress, QuizKind::MultipleChoice, None).unwrap();

        answer_correctly(&mut session, &mut progress).await;
        let err = session.answer_option(&mut progress, 0).await.unwrap_err();
        assert!(matches!(err, SessionError::AlreadyAnswered));
        assert_eq!(progress.stats().total_answered(), 1);
    }

    #[tokio::test]
    async fn advance_requires_an_answer() {
        let repo = InMemoryRepository::new();
        let progress = service(&repo, 3).await;
        let mut session = QuizSession::start(&progress, QuizKind::MultipleChoice, None).unwrap();
        assert!(matches!(session.advance(), Err(SessionError::NotAnswered)));
    }

    #[tokio::test]
    async fn option_index_out_of_range_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 2).await;
        let mut session = QuizSession::start(&progress, QuizKind::MultipleChoice, None).unwrap();
        let err = session.answer_option(&mut progress, 9).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidOption { index: 9, len: 3 }));
        assert!(progress.ledger().is_empty());
    }

    #[tokio::test]
    async fn options_keep_their_order_until_advance() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        let mut session = QuizSession::start(&progress, QuizKind::MultipleChoice, None).unwrap();

        let before = session.options().unwrap().clone();
        answer_wrongly(&mut session, &mut progress).await;
        assert_eq!(session.options(), Some(&before));
    }

    #[tokio::test]
    async fn hint_is_hidden_until_revealed() {
        let repo = InMemoryRepository::new();
        let progress = service(&repo, 2).await;
        let mut session = QuizSession::start(&progress, QuizKind::MultipleChoice, None).unwrap();

        assert!(session.hint().is_none());
        let id = session.current().unwrap().id();
        let hint = session.reveal_hint().unwrap().to_owned();
        assert_eq!(hint, format!("Hint {id}"));
    }

    #[tokio::test]
    async fn typed_answers_are_matched_leniently() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 2).await;
        let mut session = QuizSession::start(&progress, QuizKind::TypedAnswer, None).unwrap();

        let id = session.current().unwrap().id();
        let feedback = session
            .answer_text(&mut progress, &format!("  answer   {id}! "))
            .await
            .unwrap();
        assert!(feedback.was_correct);
        assert_eq!(feedback.entry.correct_count(), 1);
    }

    #[tokio::test]
    async fn flashcards_must_be_flipped_before_grading() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 2).await;
        let mut session = QuizSession::start(&progress, QuizKind::Flashcards, None).unwrap();

        assert!(session.options().is_none());
        let err = session.self_grade(&mut progress, true).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFlipped));

        session.flip().unwrap();
        let feedback = session.self_grade(&mut progress, false).await.unwrap();
        assert!(!feedback.was_correct);
        assert!(matches!(session.flip(), Err(SessionError::AlreadyAnswered)));
    }

    #[tokio::test]
    async fn mode_specific_actions_are_rejected_elsewhere() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 2).await;
        let mut session = QuizSession::start(&progress, QuizKind::MultipleChoice, None).unwrap();

        assert!(matches!(session.flip(), Err(SessionError::WrongMode(_))));
        let err = session.answer_text(&mut progress, "x").await.unwrap_err();
        assert!(matches!(err, SessionError::WrongMode(_)));
    }

    #[tokio::test]
    async fn weak_spot_without_hard_questions_has_no_material() {
        let repo = InMemoryRepository::new();
        let progress = service(&repo, 4).await;
        assert!(matches!(
            QuizSession::start(&progress, QuizKind::WeakSpot, None),
            Err(SessionError::NoMaterial)
        ));
    }

    #[tokio::test]
    async fn weak_spot_drill_counts_improvements() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 4).await;
        for id in [1, 3] {
            progress.record_answer(QuestionId::new(id), false).await.unwrap();
            progress.record_answer(QuestionId::new(id), false).await.unwrap();
        }

        let mut session = QuizSession::start(&progress, QuizKind::WeakSpot, None).unwrap();
        assert_eq!(session.drilled(), 2);
        let ids: HashSet<_> = [QuestionId::new(1), QuestionId::new(3)].into();
        assert!(ids.contains(&session.current().unwrap().id()));

        answer_correctly(&mut session, &mut progress).await;
        session.advance().unwrap();
        answer_wrongly(&mut session, &mut progress).await;

        assert_eq!(session.score().improved(), 1);
        assert_eq!(session.improvement_rate(), 50);
        assert_eq!(session.score().accuracy(), 50);
    }

    #[tokio::test]
    async fn restart_skips_questions_answered_this_session() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 4).await;
        let mut session =
            QuizSession::start(&progress, QuizKind::MultipleChoice, Some(2)).unwrap();

        let mut first_round = HashSet::new();
        while let Some(question) = session.current() {
            first_round.insert(question.id());
            answer_correctly(&mut session, &mut progress).await;
            session.advance().unwrap();
        }

        session.restart(&progress).unwrap();
        assert_eq!(session.score(), SessionScore::new());
        while let Some(question) = session.current() {
            assert!(!first_round.contains(&question.id()));
            answer_correctly(&mut session, &mut progress).await;
            session.advance().unwrap();
        }

        // Bank exhausted: the exclusion set starts over.
        session.restart(&progress).unwrap();
        assert_eq!(session.progress().total, 2);
    }

    #[tokio::test]
    async fn failed_restart_leaves_the_session_unchanged() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        progress.record_answer(QuestionId::new(2), false).await.unwrap();

        let mut session = QuizSession::start(&progress, QuizKind::WeakSpot, None).unwrap();
        answer_correctly(&mut session, &mut progress).await;
        session.advance().unwrap();
        assert!(session.is_complete());

        // The only weak spot was fixed, so there is nothing left to drill.
        assert!(matches!(
            session.restart(&progress),
            Err(SessionError::NoMaterial)
        ));
        assert!(session.answered_ids.contains(&QuestionId::new(2)));
        assert!(session.is_complete());
        assert_eq!(session.score().correct(), 1);
        assert_eq!(session.score().improved(), 1);
    }
}
