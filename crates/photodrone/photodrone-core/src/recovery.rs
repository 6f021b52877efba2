//! Timer driving target recovery polls.
//!
//! Recovery is a plain state machine advanced by the rig tick: polls are due
//! at every multiple of the interval, the last one at the timeout. A failed
//! final poll means the rig gets destroyed.

use crate::config::RecoveryCfg;

/// Smallest accepted poll interval.
const MIN_INTERVAL: f32 = 1e-3;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecoveryPoll {
    /// Nothing due this tick.
    Wait,
    /// Query the roster now.
    Poll,
    /// Query the roster one last time; give up if it fails.
    PollFinal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecoveryTimer {
    clock: f32,
    ticks: u32,
    polls: u32,
    interval: f32,
    timeout: f32,
}

impl RecoveryTimer {
    pub fn new(interval: f32, timeout: f32) -> Self {
        Self {
            clock: 0.0,
            ticks: 0,
            polls: 0,
            interval: interval.max(MIN_INTERVAL),
            timeout: timeout.max(0.0),
        }
    }

    pub fn from_cfg(cfg: &RecoveryCfg) -> Self {
        Self::new(cfg.poll_interval, cfg.timeout)
    }

    /// Time spent recovering so far.
    pub fn elapsed(&self) -> f32 {
        self.clock
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn advance(&mut self, dt: f32) -> RecoveryPoll {
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt;
            self.ticks += 1;
        }
        // Rounding error of the running sum is bounded by one epsilon of the
        // clock per addition, so a single long tick gets almost no slack.
        let slack = self.ticks as f32 * f32::EPSILON * self.clock;
        let now = self.clock + slack;
        if now >= self.timeout {
            self.polls += 1;
            return RecoveryPoll::PollFinal;
        }
        // Several intervals inside one long tick still yield a single poll.
        let due = (now / self.interval).floor() as u32;
        if due > self.polls {
            self.polls = due;
            RecoveryPoll::Poll
        } else {
            RecoveryPoll::Wait
        }
    }
}

impl Default for RecoveryTimer {
    fn default() -> Self {
        Self::from_cfg(&RecoveryCfg::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_times(timer: &mut RecoveryTimer, dt: f32, steps: usize) -> Vec<(f32, RecoveryPoll)> {
        let mut out = Vec::new();
        for _ in 0..steps {
            let poll = timer.advance(dt);
            if poll != RecoveryPoll::Wait {
                out.push((timer.elapsed(), poll));
            }
            if poll == RecoveryPoll::PollFinal {
                break;
            }
        }
        out
    }

    #[test]
    fn polls_every_interval_and_finishes_at_timeout() {
        let mut timer = RecoveryTimer::default();
        let polls = poll_times(&mut timer, 0.125, 100);
        assert_eq!(polls.len(), 12);
        assert_eq!(polls[0], (0.25, RecoveryPoll::Poll));
        assert_eq!(polls[10], (2.75, RecoveryPoll::Poll));
        assert_eq!(polls[11], (3.0, RecoveryPoll::PollFinal));
    }

    #[test]
    fn drift_from_small_steps_does_not_delay_polls() {
        let mut timer = RecoveryTimer::default();
        let polls = poll_times(&mut timer, 0.05, 200);
        // 0.05 is not exact in binary; the fifth step must still poll.
        assert!((polls[0].0 - 0.25).abs() < 1e-4);
        assert!((polls.last().map(|p| p.0).unwrap_or(0.0) - 3.0).abs() < 1e-4);
        assert_eq!(polls.last().map(|p| p.1), Some(RecoveryPoll::PollFinal));
    }

    #[test]
    fn long_tick_polls_once() {
        let mut timer = RecoveryTimer::default();
        assert_eq!(timer.advance(0.8), RecoveryPoll::Poll);
        assert_eq!(timer.advance(0.1), RecoveryPoll::Wait);
        assert_eq!(timer.advance(0.1), RecoveryPoll::Poll);
    }

    #[test]
    fn single_tick_just_short_of_timeout_is_not_final() {
        let mut timer = RecoveryTimer::default();
        assert_eq!(timer.advance(2.99999), RecoveryPoll::Poll);
        assert_eq!(timer.polls(), 11);
        assert_eq!(timer.advance(0.00001), RecoveryPoll::PollFinal);
    }

    #[test]
    fn sixty_hz_ticks_finish_on_the_timeout_frame() {
        let mut timer = RecoveryTimer::default();
        let polls = poll_times(&mut timer, 1.0 / 60.0, 400);
        assert_eq!(polls.len(), 12);
        assert_eq!(polls.last().map(|p| p.1), Some(RecoveryPoll::PollFinal));
        assert!((polls[11].0 - 3.0).abs() < 1e-3, "final at {}", polls[11].0);
    }

    #[test]
    fn zero_timeout_gives_up_on_first_tick() {
        let mut timer = RecoveryTimer::new(0.25, 0.0);
        assert_eq!(timer.advance(0.0), RecoveryPoll::PollFinal);
    }
}
