use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use speedy2d::window::UserEventSender;

use super::error::Result;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// User event posted into the window's event loop once per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Waiting { deadline: Instant },
    // deadline is the one this refresh was started for
    Refreshing { deadline: Instant },
    Terminated,
}

/// What the window should do after a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Committed,
    Skipped,
    Stopped,
}

/// Decides when a refresh may run. Lives on the GUI thread; ticks that arrive
/// early or while a refresh is in progress are dropped.
///
/// Deadlines follow a fixed schedule `armed_at + k * interval`, so a ticker posting
/// at the same period gets one refresh per tick. Periods missed during a slow
/// refresh are skipped rather than replayed.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    state: SchedulerState,
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> RefreshScheduler {
        RefreshScheduler {
            interval: interval.max(MIN_INTERVAL),
            state: SchedulerState::Idle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SchedulerState::Terminated
    }

    /// Enters `Waiting` with the first deadline one interval from `now`. Returns
    /// false if the deadline is not representable; the scheduler then stays idle.
    pub fn arm(&mut self, now: Instant) -> bool {
        if self.is_terminated() {
            return false;
        }
        match now.checked_add(self.interval) {
            Some(deadline) => {
                self.state = SchedulerState::Waiting { deadline };
                true
            }
            None => {
                warn!("Refresh interval {:?} is out of range, timer not armed", self.interval);
                self.state = SchedulerState::Idle;
                false
            }
        }
    }

    /// Returns true if the caller should run a refresh now.
    pub fn begin_refresh(&mut self, now: Instant) -> bool {
        match self.state {
            SchedulerState::Waiting { deadline } if now >= deadline => {
                self.state = SchedulerState::Refreshing { deadline };
                true
            }
            _ => false,
        }
    }

    /// Runs a refresh regardless of the deadline, unless one is already running.
    pub fn begin_forced_refresh(&mut self, now: Instant) -> bool {
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::Refreshing { deadline: now };
                true
            }
            SchedulerState::Waiting { deadline } => {
                self.state = SchedulerState::Refreshing { deadline };
                true
            }
            _ => false,
        }
    }

    /// Applies the tick policy to a finished refresh: failures stop the scheduler
    /// when `strict`, otherwise the tick is skipped and the timer re-armed.
    pub fn complete_refresh<T>(&mut self, result: &Result<T>, strict: bool, now: Instant) -> RefreshOutcome {
        match result {
            Ok(_) => {
                self.finish_refresh(now);
                RefreshOutcome::Committed
            }
            Err(_) if strict => {
                self.terminate();
                RefreshOutcome::Stopped
            }
            Err(_) => {
                self.finish_refresh(now);
                RefreshOutcome::Skipped
            }
        }
    }

    fn finish_refresh(&mut self, now: Instant) {
        if let SchedulerState::Refreshing { deadline } = self.state {
            match self.next_deadline(deadline, now) {
                Some(next) => self.state = SchedulerState::Waiting { deadline: next },
                None => {
                    warn!("Next refresh deadline is out of range, timer not re-armed");
                    self.state = SchedulerState::Idle;
                }
            }
        }
    }

    // first deadline on the schedule that is still ahead of `now`
    fn next_deadline(&self, deadline: Instant, now: Instant) -> Option<Instant> {
        if deadline > now {
            return Some(deadline);
        }
        let periods = now.duration_since(deadline).as_nanos() / self.interval.as_nanos() + 1;
        let offset = u64::try_from(self.interval.as_nanos().checked_mul(periods)?).ok()?;
        deadline.checked_add(Duration::from_nanos(offset))
    }

    pub fn terminate(&mut self) {
        self.state = SchedulerState::Terminated;
    }
}

/// Posts a `RefreshTick` every `interval` until the event loop goes away.
pub fn spawn_ticker(sender: UserEventSender<RefreshTick>, interval: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("Refresh ticker started, interval {:?}", interval);
        loop {
            thread::sleep(interval);
            if let Err(error) = sender.send_event(RefreshTick) {
                debug!("Refresh ticker stopping: {:?}", error);
                break;
            }
        }
    })
}
