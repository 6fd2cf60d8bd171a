mod arcade;
mod progress;
mod quiz;
mod speed;
mod timings;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use arcade::{ArcadeOutcome, ArcadeRun};
pub use progress::SessionProgress;
pub use quiz::{AnswerFeedback, QuizKind, QuizSession};
pub use speed::{SpeedAnswer, SpeedRound};
pub use timings::ModeTimings;
