use std::time::Duration;

/// Timing constants of the timed and arcade modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTimings {
    /// Length of a speed round.
    pub speed_round_secs: u32,
    /// How long answer feedback stays up before the next question.
    pub feedback_delay: Duration,
    /// Arcade speed gained per correct answer.
    pub arcade_speed_step: f64,
    /// Arcade speed ceiling.
    pub arcade_max_speed: f64,
}

impl Default for ModeTimings {
    fn default() -> Self {
        Self {
            speed_round_secs: 60,
            feedback_delay: Duration::from_secs(1),
            arcade_speed_step: 0.05,
            arcade_max_speed: 2.0,
        }
    }
}
