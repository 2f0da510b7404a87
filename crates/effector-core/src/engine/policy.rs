//! Retry and repeat policies: decide delays between attempts and ticks.

use std::time::Duration;

/// Retry policy for failed precondition/action attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between two failed attempts.
    pub delay: Duration,

    /// One-shot: absolute deadline measured from spawn.
    /// Timed/periodic: bound on the waiting/setup phase only.
    /// `None` means "until cancelled".
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(delay: Duration, timeout: Option<Duration>) -> Self {
        Self { delay, timeout }
    }

    /// 1s between attempts, no deadline.
    pub fn default_v1() -> Self {
        Self {
            delay: Duration::from_secs(1),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_v1()
    }
}

/// What a failed periodic tick does to the effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickFailure {
    /// Keep ticking; the failed interval counts against the duration.
    #[default]
    Continue,

    /// The failed interval is added back to the deadline.
    /// Extension is capped at one full duration in total.
    Extend,

    /// End the effect (the completion hook still runs).
    Abort,
}

/// Cadence of a periodic effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatPolicy {
    /// Delay between setup attempts while the setup action fails.
    pub setup_delay: Duration,

    /// Delay between two ticks.
    pub interval: Duration,

    pub on_tick_failure: TickFailure,
}

impl RepeatPolicy {
    pub fn new(setup_delay: Duration, interval: Duration) -> Self {
        Self {
            setup_delay,
            interval,
            on_tick_failure: TickFailure::Continue,
        }
    }

    pub fn on_tick_failure(mut self, policy: TickFailure) -> Self {
        self.on_tick_failure = policy;
        self
    }

    /// `true`: a failed tick resets its interval onto the clock (`Extend`).
    pub fn reset_on_tick_failure(self, reset: bool) -> Self {
        self.on_tick_failure(if reset {
            TickFailure::Extend
        } else {
            TickFailure::Continue
        })
    }
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(1))
    }
}
