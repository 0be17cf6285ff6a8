use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check. Being limited is normal control flow,
/// not an error: the caller surfaces the wait time as HTTP 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { wait_secs: u64 },
}

/// Read-only view of the limiter for health/metrics introspection.
#[derive(Debug, Clone, Copy)]
pub struct RateSnapshot {
    pub requests_in_window: u32,
    pub window_remaining_secs: u64,
}

/// Guards outbound submissions to the staging vendor: a single-slot
/// cooldown between consecutive requests plus a rolling per-window quota.
///
/// All methods take an explicit `now` so the arithmetic is testable
/// without sleeping; callers pass `Instant::now()`.
pub struct RateLimiter {
    min_interval: Duration,
    window: Duration,
    window_max: u32,
    state: Mutex<LimiterState>,
}

struct LimiterState {
    last_request: Option<Instant>,
    window_start: Instant,
    requests_in_window: u32,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, window: Duration, window_max: u32) -> Self {
        Self {
            min_interval,
            window,
            window_max,
            state: Mutex::new(LimiterState {
                last_request: None,
                window_start: Instant::now(),
                requests_in_window: 0,
            }),
        }
    }

    /// Decide whether a submission may go out at `now`.
    ///
    /// The quota window is reset first (exactly once per elapsed window),
    /// then the window quota and the cooldown are checked in that order.
    /// Does not mutate the acceptance bookkeeping; call
    /// [`record_accepted`](Self::record_accepted) after the vendor call
    /// actually succeeded.
    pub fn check(&self, now: Instant) -> RateDecision {
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");

        if now.duration_since(state.window_start) >= self.window {
            state.requests_in_window = 0;
            state.window_start = now;
        }

        if state.requests_in_window >= self.window_max {
            let remaining = self
                .window
                .saturating_sub(now.duration_since(state.window_start));
            return RateDecision::Limited {
                wait_secs: ceil_secs(remaining),
            };
        }

        if let Some(last) = state.last_request {
            let elapsed = now.duration_since(last);
            if elapsed < self.min_interval {
                return RateDecision::Limited {
                    wait_secs: ceil_secs(self.min_interval - elapsed),
                };
            }
        }

        RateDecision::Allowed
    }

    /// Book an accepted submission. Only call after the vendor confirmed it.
    pub fn record_accepted(&self, now: Instant) {
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");
        state.last_request = Some(now);
        state.requests_in_window += 1;
    }

    pub fn snapshot(&self, now: Instant) -> RateSnapshot {
        let state = self.state.lock().expect("rate limiter mutex poisoned");
        let elapsed = now.duration_since(state.window_start);
        if elapsed >= self.window {
            return RateSnapshot {
                requests_in_window: 0,
                window_remaining_secs: 0,
            };
        }
        RateSnapshot {
            requests_in_window: state.requests_in_window,
            window_remaining_secs: (self.window - elapsed).as_secs(),
        }
    }
}

/// Round a wait duration up to whole seconds, so "please retry in N
/// seconds" never undershoots.
fn ceil_secs(d: Duration) -> u64 {
    d.as_millis().div_ceil(1000) as u64
}
