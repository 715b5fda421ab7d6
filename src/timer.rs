//! Cancelable timers
//!
//! The session never sleeps or spawns; it asks a [`Scheduler`] for a handle
//! and later receives that handle back through `Session::on_timer`. Handles
//! are never reused, so a callback that outlived its game can be recognised
//! and dropped.

use std::time::Duration;

/// Identifies one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Milliseconds for a browser timer call, saturating at `i32::MAX`
pub fn delay_millis(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}

/// Host-side timer facility
pub trait Scheduler {
    /// Fire once after `delay`
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle;

    /// Fire every `period` until cancelled
    fn schedule_repeating(&mut self, period: Duration) -> TimerHandle;

    /// Stop a timer. Cancelling a fired or unknown handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone)]
struct Pending {
    handle: TimerHandle,
    due: Duration,
    period: Option<Duration>,
}

/// Virtual-clock scheduler for tests and headless runs
///
/// Time only moves when the owner calls [`ManualScheduler::pop_due`] or
/// [`ManualScheduler::set_now`]. Timers due at the same instant fire in the
/// order they were scheduled.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of live timers
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Pop the earliest timer due at or before `deadline`, moving the clock to
    /// its due time. Repeating timers are re-armed for their next period.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<TimerHandle> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= deadline)
            .min_by_key(|(_, p)| (p.due, p.handle))
            .map(|(i, _)| i)?;

        let fired = self.pending[idx].clone();
        self.now = self.now.max(fired.due);
        match fired.period {
            Some(period) => self.pending[idx].due = fired.due + period,
            None => {
                self.pending.remove(idx);
            }
        }
        Some(fired.handle)
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(Pending {
            handle,
            due: self.now + delay,
            period,
        });
        handle
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, delay: Duration) -> TimerHandle {
        self.push(delay, None)
    }

    fn schedule_repeating(&mut self, period: Duration) -> TimerHandle {
        // Zero period would re-fire forever at the same instant
        self.push(period, Some(period.max(Duration::from_millis(1))))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|p| p.handle != handle);
    }
}
