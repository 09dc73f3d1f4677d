use crate::analysis::types::{RateLimitOrigin, ServiceError};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

const HOURLY_WINDOW: Duration = Duration::from_secs(3600);

/// Fixed-window request limiter shared by every client built from it.
///
/// Cloning is cheap and yields a handle to the same window. Admission and
/// usage recording are split: [`admit`](Self::admit) reserves a slot and
/// returns a [`RatePermit`]; the slot is only charged to the window when the
/// permit is [`record`](RatePermit::record)ed. Dropping an unrecorded permit
/// (validation failure, cancellation, exhausted retries) releases the slot.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateWindow>>,
}

#[derive(Debug, Clone)]
pub struct RateWindow {
    pub request_count: u32,
    pub window_start: DateTime<Utc>,
    pub window_duration: TimeDelta,
    pub max_requests: u32,
    in_flight: u32,
}

/// A reserved slot in the current window.
#[derive(Debug)]
#[must_use = "an unrecorded permit releases its slot when dropped"]
pub struct RatePermit {
    state: Arc<Mutex<RateWindow>>,
    granted_at: DateTime<Utc>,
    recorded: bool,
}

#[derive(Debug, Clone)]
pub struct RateLimiterStatus {
    pub request_count: u32,
    pub max_requests: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimiter {
    pub fn new(max_requests_per_hour: u32) -> Self {
        Self::with_window(max_requests_per_hour, HOURLY_WINDOW)
    }

    pub fn with_window(max_requests: u32, window: Duration) -> Self {
        let window_duration = TimeDelta::from_std(window).unwrap_or(TimeDelta::hours(1));
        let state = RateWindow {
            request_count: 0,
            window_start: Utc::now(),
            window_duration,
            max_requests,
            in_flight: 0,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn admit(&self) -> Result<RatePermit, ServiceError> {
        self.admit_at(Utc::now())
    }

    pub(crate) fn admit_at(&self, now: DateTime<Utc>) -> Result<RatePermit, ServiceError> {
        let mut state = self.lock();

        if now.signed_duration_since(state.window_start) >= state.window_duration {
            debug!(
                previous_count = state.request_count,
                "Rate window elapsed, starting a new window"
            );
            state.request_count = 0;
            state.window_start = now;
        }

        if state.request_count + state.in_flight >= state.max_requests {
            let window_end = state.window_start + state.window_duration;
            let remaining_ms = window_end.signed_duration_since(now).num_milliseconds().max(0);
            let retry_after_secs = (remaining_ms as u64).div_ceil(1000);
            return Err(ServiceError::RateLimit {
                message: format!("Rate limit exceeded. Try again in {retry_after_secs} seconds."),
                retry_after_secs,
                origin: RateLimitOrigin::Local,
            });
        }

        state.in_flight += 1;

        Ok(RatePermit {
            state: Arc::clone(&self.state),
            granted_at: now,
            recorded: false,
        })
    }

    /// Change the ceiling without resetting the current window.
    pub fn set_max_requests(&self, max_requests: u32) {
        self.lock().max_requests = max_requests;
    }

    pub fn status(&self) -> RateLimiterStatus {
        let state = self.lock();
        RateLimiterStatus {
            request_count: state.request_count,
            max_requests: state.max_requests,
            remaining: state
                .max_requests
                .saturating_sub(state.request_count + state.in_flight),
            reset_at: state.window_start + state.window_duration,
        }
    }

    pub fn window(&self) -> RateWindow {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RateWindow> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RatePermit {
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Charge this request to the window. Called once, after a successful
    /// dispatch.
    pub fn record(mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);
        state.request_count += 1;
        self.recorded = true;
    }
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        if self.recorded {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}
