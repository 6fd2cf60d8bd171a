mod choices;
mod countdown;
mod ids;
mod ledger;
mod performance;
pub(crate) mod question;
mod session;
mod stats;

pub use ids::{ParseIdError, QuestionId};

pub use choices::ShuffledOptions;
pub use countdown::{Countdown, CountdownError, TickOutcome, TimerEpoch, TimerToken};
pub use ledger::{LedgerError, PerformanceLedger};
pub use performance::{DifficultyTier, MASTERY_THRESHOLD, PerformanceEntry};
pub use question::{QuestionBank, QuestionBankError, QuestionDraft, QuestionError, QuestionRecord};
pub use session::SessionScore;
pub use stats::SessionStats;
