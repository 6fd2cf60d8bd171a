use std::time::Duration;

use quiz_core::model::{
    Countdown, QuestionRecord, SessionScore, ShuffledOptions, TickOutcome, TimerEpoch, TimerToken,
};

use super::quiz::{AnswerFeedback, QuizKind, QuizSession};
use super::timings::ModeTimings;
use crate::error::SessionError;
use crate::progress_service::ProgressService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundState {
    Ready,
    Running,
    Finished,
}

/// Answer feedback plus the callback the driver must schedule to move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedAnswer {
    pub feedback: AnswerFeedback,
    /// Present to [`SpeedRound::auto_advance`] after `delay`.
    pub advance_token: TimerToken,
    pub delay: Duration,
}

/// Timed multiple-choice round.
///
/// The round owns no timers. The driver schedules a tick every second with
/// the token from [`SpeedRound::start`], and one auto-advance per answer with
/// the token from [`SpeedAnswer`]. Restarting or stopping invalidates every
/// token handed out before, so late callbacks are no-ops.
pub struct SpeedRound {
    session: QuizSession,
    countdown: Countdown,
    advance_epoch: TimerEpoch,
    feedback_delay: Duration,
    state: RoundState,
    remaining_at_finish: u32,
}

impl SpeedRound {
    /// Select the round's questions. The clock does not run until `start`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoMaterial` for an empty bank and
    /// `SessionError::Countdown` for a zero-length round.
    pub fn new(progress: &ProgressService, timings: ModeTimings) -> Result<Self, SessionError> {
        let countdown = Countdown::new(timings.speed_round_secs)?;
        let session = QuizSession::start(progress, QuizKind::MultipleChoice, None)?;
        Ok(Self {
            session,
            countdown,
            advance_epoch: TimerEpoch::new(),
            feedback_delay: timings.feedback_delay,
            state: RoundState::Ready,
            remaining_at_finish: 0,
        })
    }

    /// Start the clock. Returns the token every tick must carry.
    ///
    /// Calling it again restarts the clock and invalidates every tick and
    /// auto-advance token handed out before.
    pub fn start(&mut self) -> TimerToken {
        self.advance_epoch.invalidate();
        self.state = RoundState::Running;
        tracing::debug!(secs = self.countdown.duration_secs(), "speed round started");
        self.countdown.start()
    }

    /// Apply one elapsed second.
    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        let outcome = self.countdown.tick(token);
        if outcome == TickOutcome::Expired {
            self.finish();
        }
        outcome
    }

    /// Answer the current question with an option index.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` unless the clock is running, plus
    /// the errors of [`QuizSession::answer_option`].
    pub async fn answer(
        &mut self,
        progress: &mut ProgressService,
        index: usize,
    ) -> Result<SpeedAnswer, SessionError> {
        if self.state != RoundState::Running {
            return Err(SessionError::NotRunning);
        }
        let feedback = self.session.answer_option(progress, index).await?;
        Ok(SpeedAnswer {
            feedback,
            advance_token: self.advance_epoch.issue(),
            delay: self.feedback_delay,
        })
    }

    /// Move on after feedback. Returns `false` for a stale token.
    pub fn auto_advance(&mut self, token: TimerToken) -> bool {
        if self.state != RoundState::Running || !self.advance_epoch.is_current(token) {
            return false;
        }
        self.advance_epoch.invalidate();
        match self.session.advance() {
            Ok(true) => {}
            Ok(false) | Err(_) => self.finish(),
        }
        true
    }

    /// End the round now. Outstanding ticks and advances become stale.
    pub fn stop(&mut self) {
        if self.state == RoundState::Running {
            self.finish();
        } else {
            self.countdown.cancel();
            self.advance_epoch.invalidate();
            self.state = RoundState::Finished;
        }
    }

    /// Fresh questions, zero score, full clock. Returns the new tick token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoMaterial` if nothing can be selected.
    pub fn restart(&mut self, progress: &ProgressService) -> Result<TimerToken, SessionError> {
        self.session.restart(progress)?;
        Ok(self.start())
    }

    fn finish(&mut self) {
        self.remaining_at_finish = self.countdown.remaining_secs();
        if !self.countdown.is_expired() {
            self.countdown.cancel();
        }
        self.advance_epoch.invalidate();
        self.state = RoundState::Finished;
        tracing::info!(
            answered = self.session.score().answered(),
            correct = self.session.score().correct(),
            "speed round finished"
        );
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == RoundState::Running
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == RoundState::Finished
    }

    /// Seconds left on the clock.
    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        match self.state {
            RoundState::Finished => self.remaining_at_finish,
            _ => self.countdown.remaining_secs(),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuestionRecord> {
        if self.is_finished() {
            None
        } else {
            self.session.current()
        }
    }

    #[must_use]
    pub fn options(&self) -> Option<&ShuffledOptions> {
        self.session.options()
    }

    #[must_use]
    pub fn score(&self) -> SessionScore {
        self.session.score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress_service::tests::service;
    use storage::repository::InMemoryRepository;

    fn timings(secs: u32) -> ModeTimings {
        ModeTimings {
            speed_round_secs: secs,
            ..ModeTimings::default()
        }
    }

    async fn answer_correctly(round: &mut SpeedRound, progress: &mut ProgressService) -> SpeedAnswer {
        let index = round.options().unwrap().correct_index();
        round.answer(progress, index).await.unwrap()
    }

    #[tokio::test]
    async fn answers_are_rejected_before_start() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        let mut round = SpeedRound::new(&progress, ModeTimings::default()).unwrap();

        let err = round.answer(&mut progress, 0).await.unwrap_err();
        assert!(matches!(err, SessionError::NotRunning));
        assert_eq!(round.remaining_secs(), 60);
    }

    #[tokio::test]
    async fn expiry_finishes_the_round() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        let mut round = SpeedRound::new(&progress, timings(2)).unwrap();
        let tick = round.start();

        answer_correctly(&mut round, &mut progress).await;
        assert_eq!(round.tick(tick), TickOutcome::Running { remaining_secs: 1 });
        assert_eq!(round.tick(tick), TickOutcome::Expired);
        assert!(round.is_finished());
        assert_eq!(round.remaining_secs(), 0);
        assert!(round.current().is_none());
        assert_eq!(round.score().correct(), 1);
    }

    #[tokio::test]
    async fn auto_advance_moves_to_the_next_question_once() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        let mut round = SpeedRound::new(&progress, ModeTimings::default()).unwrap();
        round.start();

        let first = round.current().unwrap().id();
        let answer = answer_correctly(&mut round, &mut progress).await;
        assert_eq!(answer.delay, Duration::from_secs(1));

        assert!(round.auto_advance(answer.advance_token));
        assert_ne!(round.current().unwrap().id(), first);
        assert!(!round.auto_advance(answer.advance_token));
    }

    #[tokio::test]
    async fn running_out_of_questions_finishes_the_round() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 1).await;
        let mut round = SpeedRound::new(&progress, ModeTimings::default()).unwrap();
        let tick = round.start();

        let answer = answer_correctly(&mut round, &mut progress).await;
        assert!(round.auto_advance(answer.advance_token));
        assert!(round.is_finished());
        assert_eq!(round.tick(tick), TickOutcome::Stale);
    }

    #[tokio::test]
    async fn restart_invalidates_pending_callbacks() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 4).await;
        let mut round = SpeedRound::new(&progress, ModeTimings::default()).unwrap();
        let old_tick = round.start();
        round.tick(old_tick);
        let answer = answer_correctly(&mut round, &mut progress).await;

        let new_tick = round.restart(&progress).unwrap();
        assert_eq!(round.tick(old_tick), TickOutcome::Stale);
        assert!(!round.auto_advance(answer.advance_token));
        assert_eq!(round.score(), SessionScore::new());
        assert_eq!(
            round.tick(new_tick),
            TickOutcome::Running { remaining_secs: 59 }
        );
    }

    #[tokio::test]
    async fn starting_again_invalidates_pending_auto_advance() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        let mut round = SpeedRound::new(&progress, ModeTimings::default()).unwrap();
        let old_tick = round.start();
        let first = round.current().unwrap().id();
        let answer = answer_correctly(&mut round, &mut progress).await;

        let new_tick = round.start();
        assert!(!round.auto_advance(answer.advance_token));
        assert_eq!(round.current().unwrap().id(), first);
        assert_eq!(round.tick(old_tick), TickOutcome::Stale);
        assert_eq!(
            round.tick(new_tick),
            TickOutcome::Running { remaining_secs: 59 }
        );
    }

    #[tokio::test]
    async fn stop_makes_every_token_stale() {
        let repo = InMemoryRepository::new();
        let mut progress = service(&repo, 3).await;
        let mut round = SpeedRound::new(&progress, ModeTimings::default()).unwrap();
        let tick = round.start();
        let answer = answer_correctly(&mut round, &mut progress).await;

        round.stop();
        assert_eq!(round.tick(tick), TickOutcome::Stale);
        assert!(!round.auto_advance(answer.advance_token));
        assert!(round.is_finished());
    }

    #[tokio::test]
    async fn zero_length_round_is_rejected() {
        let repo = InMemoryRepository::new();
        let progress = service(&repo, 3).await;
        assert!(matches!(
            SpeedRound::new(&progress, timings(0)),
            Err(SessionError::Countdown(_))
        ));
    }
}
