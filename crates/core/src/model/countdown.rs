use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CountdownError {
    #[error("countdown duration must be > 0 seconds")]
    ZeroDuration,
}

//
// ─── TIMER TOKENS ──────────────────────────────────────────────────────────────
//

/// Handle carried by a scheduled callback (a tick or a delayed advance).
///
/// A callback must present its token back to the owner, which ignores it
/// unless the token belongs to the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    epoch: u64,
}

/// Generation counter that invalidates every outstanding [`TimerToken`] at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerEpoch {
    current: u64,
}

impl TimerEpoch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a callback scheduled now.
    #[must_use]
    pub fn issue(&self) -> TimerToken {
        TimerToken {
            epoch: self.current,
        }
    }

    /// Invalidate all tokens issued so far.
    pub fn invalidate(&mut self) {
        self.current = self.current.wrapping_add(1);
    }

    #[must_use]
    pub fn is_current(&self, token: TimerToken) -> bool {
        token.epoch == self.current
    }
}

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The token predates the last start/cancel; nothing changed.
    Stale,
    Running { remaining_secs: u32 },
    /// This tick took the countdown to zero.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownState {
    Idle,
    Running,
    Expired,
}

/// One-second-resolution countdown driven by external ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    duration_secs: u32,
    remaining_secs: u32,
    state: CountdownState,
    epoch: TimerEpoch,
}

impl Countdown {
    /// # Errors
    ///
    /// Returns `CountdownError::ZeroDuration` for a zero-length countdown.
    pub fn new(duration_secs: u32) -> Result<Self, CountdownError> {
        if duration_secs == 0 {
            return Err(CountdownError::ZeroDuration);
        }
        Ok(Self {
            duration_secs,
            remaining_secs: duration_secs,
            state: CountdownState::Idle,
            epoch: TimerEpoch::new(),
        })
    }

    /// Start (or restart) from the full duration. Earlier tokens go stale.
    pub fn start(&mut self) -> TimerToken {
        self.epoch.invalidate();
        self.remaining_secs = self.duration_secs;
        self.state = CountdownState::Running;
        self.epoch.issue()
    }

    /// Apply one elapsed second on behalf of the holder of `token`.
    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        if !self.epoch.is_current(token) || self.state != CountdownState::Running {
            return TickOutcome::Stale;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = CountdownState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    /// Stop and rewind. Every outstanding token becomes stale.
    pub fn cancel(&mut self) {
        self.epoch.invalidate();
        self.remaining_secs = self.duration_secs;
        self.state = CountdownState::Idle;
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_is_rejected() {
        assert_eq!(Countdown::new(0).unwrap_err(), CountdownError::ZeroDuration);
    }

    #[test]
    fn ticks_run_down_to_expiry() {
        let mut countdown = Countdown::new(3).unwrap();
        let token = countdown.start();

        assert_eq!(
            countdown.tick(token),
            TickOutcome::Running { remaining_secs: 2 }
        );
        assert_eq!(
            countdown.tick(token),
            TickOutcome::Running { remaining_secs: 1 }
        );
        assert_eq!(countdown.tick(token), TickOutcome::Expired);
        assert!(countdown.is_expired());
        assert_eq!(countdown.tick(token), TickOutcome::Stale);
    }

    #[test]
    fn restart_invalidates_old_ticks() {
        let mut countdown = Countdown::new(10).unwrap();
        let old = countdown.start();
        countdown.tick(old);

        let fresh = countdown.start();
        assert_eq!(countdown.tick(old), TickOutcome::Stale);
        assert_eq!(countdown.remaining_secs(), 10);
        assert_eq!(
            countdown.tick(fresh),
            TickOutcome::Running { remaining_secs: 9 }
        );
    }

    #[test]
    fn cancel_stops_pending_callbacks() {
        let mut countdown = Countdown::new(5).unwrap();
        let token = countdown.start();
        countdown.cancel();

        assert_eq!(countdown.tick(token), TickOutcome::Stale);
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining_secs(), 5);
    }

    #[test]
    fn epoch_invalidation_covers_every_issued_token() {
        let mut epoch = TimerEpoch::new();
        let a = epoch.issue();
        let b = epoch.issue();
        assert!(epoch.is_current(a) && epoch.is_current(b));
        epoch.invalidate();
        assert!(!epoch.is_current(a));
        assert!(!epoch.is_current(b));
    }
}
